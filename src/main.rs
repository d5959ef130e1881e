//! Demo: builds a synthetic molecular scene, renders one frame and logs
//! per-pass draw statistics.

use std::path::Path;

use glam::Vec3;
use molpass::colour::Colour;
use molpass::engine::selection::{NamedSelection, Selection};
use molpass::gpu::dynamic_buffer::GpuVertexStore;
use molpass::gpu::render_context::RenderContext;
use molpass::gpu::vertex_format::VertexFormat;
use molpass::renderer::frame::{Camera, CameraUniform, FrameEncoder, FrameTargets};
use molpass::renderer::molecular::atom::BALLS_AND_STICKS;
use molpass::renderer::molecular::chain::CARTOON;
use molpass::renderer::pass::RenderTag;
use molpass::renderer::picking::PickReadback;
use molpass::renderer::pipelines::NoPipelines;
use molpass::renderer::scheduler::PassOutput;
use molpass::scene::{AtomRecord, ChainRecord, MemorySource, ObjectId, ResidueRecord, SSType};
use molpass::{MolecularScene, MolpassError, Options};

const TARGET_SIZE: (u32, u32) = (800, 600);
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;
const ELEMENTS: [&str; 6] = ["C", "N", "O", "S", "H", "Fe"];

/// A helix running into a sheet, broken by a chain gap, next to a grid of
/// atoms with some waters and metals.
fn demo_source() -> MemorySource {
    let mut source = MemorySource::new();

    let mut residues = Vec::new();
    for i in 0..12u64 {
        let angle = i as f32 * 100f32.to_radians();
        let ca = Vec3::new(2.3 * angle.cos(), 2.3 * angle.sin(), 1.5 * i as f32);
        residues.push(ResidueRecord::trace(ObjectId(1000 + i), "ALA", ca, SSType::Helix));
    }
    // 8 Å jump: a new extrusion starts here
    let sheet_start = Vec3::new(8.0, 0.0, 16.5 + 8.0);
    for i in 0..10u64 {
        let zigzag = if i % 2 == 0 { 0.0 } else { 1.0 };
        let ca = sheet_start + Vec3::new(zigzag, 0.0, 3.3 * i as f32);
        let ss = if i < 2 { SSType::Coil } else { SSType::Sheet };
        residues.push(ResidueRecord::trace(ObjectId(1100 + i), "VAL", ca, ss));
    }
    source.push_chain(ChainRecord {
        id: ObjectId(1),
        residues,
    });

    let mut id = 5000;
    for x in 0..10 {
        for y in 0..10 {
            for z in 0..5 {
                let element = ELEMENTS[(x + y + z) % ELEMENTS.len()];
                let position = Vec3::new(-20.0 + 2.0 * x as f32, -10.0 + 2.0 * y as f32, 2.0 * z as f32);
                let mut atom = AtomRecord::new(ObjectId(id), element, position, 1.5);
                if element == "O" && x % 3 == 0 {
                    atom.residue_name = Some("HOH".to_owned());
                }
                atom.hetero = element == "Fe";
                source.push_atom(atom);
                id += 1;
            }
        }
    }
    source
}

/// Representative command traffic: cartoon chains, hidden hydrogens,
/// outlined metals, translucent water.
fn apply_demo_commands(scene: &mut MolecularScene) {
    let chains = Selection::from(NamedSelection::Chains);
    if let Some(cartoon) = scene.render_format(CARTOON) {
        let _ = scene.set_render_format(&chains, cartoon);
    }
    let _ = scene.set_visible(&NamedSelection::Hydrogens.into(), false);

    let metals = Selection::from(NamedSelection::Metals);
    let _ = scene.set_tag(&metals, RenderTag::Outline);
    let _ = scene.set_highlight_colour(&metals, Some(Colour::new(255, 220, 0)));
    if let Some(balls) = scene.render_format(BALLS_AND_STICKS) {
        let _ = scene.set_render_format(&metals, balls);
    }

    let water = Selection::from(NamedSelection::Water);
    let _ = scene.set_tag(&water, RenderTag::Transparent);
    let _ = scene.set_alpha(&water, 90);

    let _ = scene.set_tint_colour(&NamedSelection::Sulphur.into(), Some(Colour::new(230, 200, 40)));
    let _ = scene.set_tag(&[ObjectId(1003), ObjectId(1004)].into_iter().collect(), RenderTag::Shade);
}

fn log_passes(frame: &[PassOutput]) {
    for output in frame {
        log::info!(
            "{:<16} {:>4} draws {:>8} vertices",
            output.pass.to_string(),
            output.draws.len(),
            output.draws.vertex_count()
        );
    }
}

/// Encode the frame and pick pass on a headless device and read back the
/// object under the centre of the target.
fn render_headless(
    scene: &mut MolecularScene,
    options: &Options,
    frame: &[PassOutput],
    pick: &PassOutput,
) -> Result<(), MolpassError> {
    let context = pollster::block_on(RenderContext::headless(TARGET_FORMAT, TARGET_SIZE))?;
    let format = VertexFormat::parse(&options.buffers.vertex_format);
    let mut frame_encoder = FrameEncoder::new(&context, &format)?;
    let targets = FrameTargets::new(&context.device, TARGET_SIZE, Some(TARGET_FORMAT));
    let mut vertices = GpuVertexStore::new();

    let sync = scene.sync_gpu(&context.device, &context.queue, &mut vertices);
    log::info!(
        "GPU sync: {} buffers created, {} uploads, {} bytes",
        sync.created,
        sync.uploads,
        sync.bytes
    );

    if let Some(bounds) = scene.bounds() {
        let aspect = TARGET_SIZE.0 as f32 / TARGET_SIZE.1 as f32;
        let camera = Camera::framing(&bounds, aspect);
        frame_encoder.update_camera(&context.queue, &CameraUniform::from_camera(&camera));
    }

    let Some(colour) = targets.colour_view() else {
        return Ok(());
    };
    let mut encoder = context.create_encoder();
    let stats = frame_encoder.encode_frame(
        &mut encoder,
        &NoPipelines,
        &vertices,
        &targets,
        colour,
        wgpu::Color::BLACK,
        frame,
    );
    let _ = frame_encoder.encode_pick(&mut encoder, &NoPipelines, &vertices, &targets, pick);
    let mut readback = PickReadback::new(&context.device);
    readback.copy_pixel(&mut encoder, &targets, (TARGET_SIZE.0 / 2, TARGET_SIZE.1 / 2));
    context.submit(encoder);
    log::info!("encoded {} draws ({} skipped)", stats.draws, stats.skipped);

    readback.start_readback();
    let _ = context.device.poll(wgpu::PollType::Wait);
    match readback.complete_readback(&context.device).map(|raw| scene.resolve_pick(raw)) {
        Some(Some(object)) => log::info!("object under the centre: {object:?}"),
        Some(None) => log::info!("nothing under the centre"),
        None => log::warn!("pick readback did not complete"),
    }
    Ok(())
}

fn run() -> Result<(), MolpassError> {
    let options = match std::env::args().nth(1) {
        Some(path) => Options::load(Path::new(&path))?,
        None => Options::default(),
    };

    let mut scene = MolecularScene::new(&options)?;
    let _ = scene.load(&demo_source());
    apply_demo_commands(&mut scene);

    let rebuild = scene.prepare();
    log::info!(
        "rebuild: {} occupants written, {} buffers swept",
        rebuild.populated,
        rebuild.swept
    );
    let frame = scene.render_frame();
    log_passes(&frame);
    let pick = scene.render_pick();
    log::info!("pick pass: {} named draws", pick.draws.len());

    // applies to geometry written from here on
    scene.set_level_of_detail(12);

    match render_headless(&mut scene, &options, &frame, &pick) {
        Err(MolpassError::Gpu(e)) => log::warn!("skipping GPU encoding: {e}"),
        other => other?,
    }
    Ok(())
}

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
