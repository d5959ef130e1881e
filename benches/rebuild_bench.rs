//! Rebuild and colour fast-path timings.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use glam::Vec3;
use molpass::colour::{Colour, ColourMap};
use molpass::engine::command::Command;
use molpass::engine::selection::Selection;
use molpass::gpu::buffer_pool::BufferPool;
use molpass::gpu::vertex_format::VertexFormat;
use molpass::registry::TokenRegistry;
use molpass::renderer::molecular::AtomManager;
use molpass::scene::ObjectSource;
use molpass::scene::{AtomRecord, MemorySource, ObjectId};
use molpass::{MolecularScene, Options};

fn atoms(count: u64) -> MemorySource {
    let mut source = MemorySource::new();
    for i in 0..count {
        let position = Vec3::new((i % 25) as f32, ((i / 25) % 20) as f32, (i / 500) as f32) * 2.0;
        source.push_atom(AtomRecord::new(ObjectId(i), "C", position, 1.7));
    }
    source
}

fn loaded(source: &MemorySource) -> MolecularScene {
    let mut scene = MolecularScene::new(&Options::default()).unwrap();
    let _ = scene.load(source);
    scene
}

fn rebuild_benchmark(c: &mut Criterion) {
    let source = atoms(10_000);
    c.bench_function("rebuild_10000_atoms", |b| {
        b.iter_batched(
            || loaded(&source),
            |mut scene| black_box(scene.prepare()),
            BatchSize::LargeInput,
        )
    });

    let mut scene = loaded(&source);
    let _ = scene.prepare();
    let half: Selection = (0..5_000).map(ObjectId).collect();
    let mut hidden = false;
    c.bench_function("hide_half_and_rebuild", |b| {
        b.iter(|| {
            hidden = !hidden;
            let _ = scene.set_visible(&half, !hidden);
            black_box(scene.prepare())
        })
    });
}

/// Colour edits through the manager, draining uploads the way a GPU sync
/// would so pending ranges do not pile up.
fn colour_benchmark(c: &mut Criterion) {
    let options = Options::default();
    let format = VertexFormat::parse(&options.buffers.vertex_format);
    let capacity = options.buffers.default_capacity(format.stride());
    let mut registry = TokenRegistry::new();
    let colours = ColourMap::builtin();
    let mut manager = AtomManager::new(&mut registry, BufferPool::new(format, capacity), &options.geometry);
    let handles: Vec<_> = atoms(10_000)
        .atoms()
        .into_iter()
        .enumerate()
        .map(|(i, record)| manager.create(record, &colours, i as u32 + 1))
        .collect();
    let _ = manager.prepare();
    let mut shade = 0u8;

    c.bench_function("colour_one_atom", |b| {
        b.iter(|| {
            shade = shade.wrapping_add(1);
            let _ = manager.apply(handles[4_242], &Command::SetColour(Colour::new(shade, 0, 0)));
            let _ = manager.prepare();
            manager.store_mut().pool_mut().drain_uploads(|_, _, op| {
                let _ = black_box(op);
            });
        })
    });
    c.bench_function("colour_all_atoms", |b| {
        b.iter(|| {
            shade = shade.wrapping_add(1);
            for &handle in &handles {
                let _ = manager.apply(handle, &Command::SetColour(Colour::new(0, shade, 0)));
            }
            let _ = manager.prepare();
            manager.store_mut().pool_mut().drain_uploads(|_, _, op| {
                let _ = black_box(op);
            });
        })
    });
}

criterion_group!(benches, rebuild_benchmark, colour_benchmark);
criterion_main!(benches);
