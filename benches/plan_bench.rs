//! Benchmarks for counting deletion plans

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fs::{self, File};
use std::io::Write;
use tempfile::TempDir;
use unity_sweeper::engine::{plan_category, CancelToken};
use unity_sweeper::layout::UnityLayout;
use unity_sweeper::rules::{CleanCategory, RuleSet};

/// Create a project-shaped tree with `file_count` files spread over
/// loose Library folders and cache subtrees.
fn create_library(file_count: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let library = dir.path().join("Library");

    let folders = ["Artifacts", "ShaderCache", "Bee", "PackageCache/com.unity.ugui"];
    for (i, folder) in folders.iter().enumerate() {
        let subdir = library.join(folder);
        fs::create_dir_all(&subdir).unwrap();

        for f in 0..file_count / folders.len() {
            let mut file = File::create(subdir.join(format!("{}_{}.bin", i, f))).unwrap();
            file.write_all(&[b'x'; 256]).unwrap();
        }
    }

    fs::create_dir_all(library.join("ScriptAssemblies")).unwrap();
    File::create(library.join("ScriptAssemblies/Assembly-CSharp.dll")).unwrap();
    File::create(library.join("LastSceneManagerSetup.txt")).unwrap();

    dir
}

fn benchmark_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_library");
    let rules = RuleSet::from_layout(&UnityLayout, &[]);
    let cancel = CancelToken::new();

    for size in [400, 2000, 8000].iter() {
        let dir = create_library(*size);

        group.bench_with_input(BenchmarkId::new("subtrees", size), size, |b, _| {
            b.iter(|| plan_category(&rules, CleanCategory::LibraryCache, black_box(dir.path()), &cancel))
        });
    }

    group.finish();
}

fn benchmark_downgraded_plan(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_downgraded");

    let dir = create_library(2000);
    let plain = RuleSet::from_layout(&UnityLayout, &[]);
    let pinned = RuleSet::from_layout(&UnityLayout, &["Library/ShaderCache/1_0.bin".to_string()]);
    let cancel = CancelToken::new();

    group.bench_function("whole_subtree", |b| {
        b.iter(|| plan_category(&plain, CleanCategory::LibraryCache, black_box(dir.path()), &cancel))
    });

    group.bench_function("per_file", |b| {
        b.iter(|| plan_category(&pinned, CleanCategory::LibraryCache, black_box(dir.path()), &cancel))
    });

    group.finish();
}

criterion_group!(benches, benchmark_plan, benchmark_downgraded_plan);
criterion_main!(benches);
