use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use graphmaster_rs::{Graphmaster, Settings};

/// A few thousand categories with a realistic mix of literals and wildcards
fn build(size: usize) -> Graphmaster {
    let settings = Settings {
        note_each_merge: false,
        category_load_notify_interval: 0,
        ..Default::default()
    };
    let gm = Graphmaster::new(settings);

    for i in 0..size {
        let word = format!("W{}", i);
        gm.add(&format!("{} IS *", word), "*", "*", "is", "bench").ok();
        gm.add(&format!("WHAT IS {}", word), "*", "*", "what", "bench").ok();
        gm.add(&format!("_ {} _", word), "*", "*", "under", "bench").ok();
        gm.add(&format!("* LIKES {}", word), &format!("DO YOU LIKE {}", word), "*", "like", "bench")
            .ok();
    }
    gm.add("*", "*", "*", "fallback", "bench").ok();
    gm
}

fn bench_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_input");

    for size in [100, 1000, 5000] {
        let gm = build(size);
        let last = format!("W{}", size - 1);

        group.bench_with_input(BenchmarkId::new("literal", size), &gm, |b, gm| {
            let input = format!("what is {}", last);
            b.iter(|| gm.match_input(black_box(&input), "", ""))
        });

        group.bench_with_input(BenchmarkId::new("wildcards", size), &gm, |b, gm| {
            let input = format!("the quick brown {} jumps over the lazy dog", last);
            b.iter(|| gm.match_input(black_box(&input), "", ""))
        });

        group.bench_with_input(BenchmarkId::new("that", size), &gm, |b, gm| {
            let that = format!("do you like {}", last);
            b.iter(|| gm.match_input(black_box("my cat likes it"), &that, ""))
        });

        group.bench_with_input(BenchmarkId::new("fallback", size), &gm, |b, gm| {
            let input = "lorem ipsum dolor sit amet consectetur adipiscing elit sed do";
            b.iter(|| gm.match_input(black_box(input), "", ""))
        });
    }

    group.finish();
}

fn bench_add(c: &mut Criterion) {
    c.bench_function("add_1000", |b| b.iter(|| build(black_box(250))));
}

criterion_group!(benches, bench_match, bench_add);
criterion_main!(benches);
