//! Resolution Benchmark
//!
//! Measures whole-program resolution and single-element queries on a
//! synthetic program with many overloaded members.

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use sema::{Origin, ResolveSession, SourceSet};

/// Generate a synthetic program: each class carries an overload set, and a
/// driver function per class calls into it with literals, lambdas and loops.
fn generate_program(class_count: usize) -> String {
    let mut source = String::with_capacity(class_count * 600);
    source.push_str("package bench\n\n");

    for i in 0..class_count {
        source.push_str(&format!(
            r#"
open class Model{i}(val id: Int) {{
    fun put(value: Int): Int = value + id
    fun put(value: Long): Long = value
    fun put(value: String): String = value
    fun put(value: Any?): Unit = println(value)
    fun apply(f: (Int) -> Int): Int = f(id)
}}

fun <T> wrap{i}(item: T): List<T> = listOf(item, item)

fun drive{i}(m: Model{i}): Int {{
    var total = m.put(1)
    m.put(2L)
    m.put("s")
    m.put(null)
    for (x in wrap{i}(total)) {{
        total = total + m.apply {{ it * x }}
    }}
    val pair = Pair(total, "done")
    return maxOf(total, pair.first)
}}
"#
        ));
    }
    source
}

fn sources(text: &str) -> SourceSet {
    let mut sources = SourceSet::with_builtins().expect("built-ins parse");
    sources
        .add_file("bench.sema", text, Origin::Source)
        .expect("synthetic program parses");
    sources
}

/// Benchmark: parse + resolve everything
fn bench_resolve_all(c: &mut Criterion) {
    let text = generate_program(100);
    let mut group = c.benchmark_group("resolve");
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.sample_size(20);
    group.bench_function("synthetic_100_classes_resolve_all", |b| {
        b.iter(|| {
            let session = ResolveSession::builder(sources(&text)).build();
            session.resolve_all().expect("not cancelled");
            black_box(session.diagnostics().len())
        })
    });
    group.finish();
}

/// Benchmark: one lazy query against a fresh session
fn bench_single_element(c: &mut Criterion) {
    let text = generate_program(100);
    let mut group = c.benchmark_group("resolve");
    group.sample_size(50);
    group.bench_function("synthetic_100_classes_single_body", |b| {
        b.iter(|| {
            let session = ResolveSession::builder(sources(&text)).build();
            let node = session
                .sources()
                .find_declaration("bench.sema", "drive50")
                .expect("driver exists");
            black_box(session.resolve_to_element(node).expect("not cancelled").types.len())
        })
    });
    group.finish();
}

criterion_group!(benches, bench_resolve_all, bench_single_element);
criterion_main!(benches);
