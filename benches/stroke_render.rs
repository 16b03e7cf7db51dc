use criterion::{black_box, criterion_group, criterion_main, Criterion};
use signature_pad::pad::export::export_data_url;
use signature_pad::pad::options::PadOptions;
use signature_pad::pad::widget::SignaturePad;

fn wavy_signature(pad: &mut SignaturePad, points: usize) {
    pad.pointer_down(10.0, 100.0, 0.0);
    for step in 1..points {
        let x = 10.0 + step as f32 * 0.75;
        let y = 100.0 + (step as f32 * 0.12).sin() * 40.0;
        pad.pointer_move(x, y, step as f64 * 4.0);
    }
    pad.pointer_up(10.0 + points as f32 * 0.75, 100.0, points as f64 * 4.0);
}

fn bench_rasterize(c: &mut Criterion) {
    c.bench_function("rasterize_500_point_stroke", |b| {
        b.iter(|| {
            let mut pad = SignaturePad::new(PadOptions::default());
            pad.initialize(400.0, 200.0);
            wavy_signature(&mut pad, 500);
            black_box(pad.surface().map(|s| s.pixels().len()))
        })
    });

    c.bench_function("rasterize_thick_stroke", |b| {
        b.iter(|| {
            let mut pad = SignaturePad::new(PadOptions {
                line_thickness: 12.0,
                speed_sensitivity: 0.0,
                ..PadOptions::default()
            });
            pad.initialize(400.0, 200.0);
            wavy_signature(&mut pad, 200);
            black_box(pad.surface().map(|s| s.pixels().len()))
        })
    });
}

fn bench_export(c: &mut Criterion) {
    let mut pad = SignaturePad::new(PadOptions::default());
    pad.initialize(400.0, 200.0);
    wavy_signature(&mut pad, 500);
    let surface = pad.surface().expect("surface").clone();
    let model = pad.model().clone();
    let options = pad.options().clone();

    c.bench_function("export_png_data_url", |b| {
        b.iter(|| black_box(export_data_url(&surface, &model, &options).unwrap()))
    });
}

criterion_group!(benches, bench_rasterize, bench_export);
criterion_main!(benches);
