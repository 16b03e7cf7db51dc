use base64::{engine::general_purpose, Engine as _};
use signature_pad::pad::options::{LineCap, PadColor, PadOptions, SaveFormat};
use signature_pad::pad::widget::SignaturePad;

fn svg_pad(options: PadOptions) -> SignaturePad {
    let mut pad = SignaturePad::new(PadOptions {
        save_format: SaveFormat::Svg,
        ..options
    });
    pad.initialize(160.0, 90.0);
    pad
}

fn decoded_svg(pad: &SignaturePad) -> String {
    let url = pad.data_url().expect("svg output");
    let payload = url.rsplit(',').next().expect("base64 payload");
    let bytes = general_purpose::STANDARD.decode(payload).expect("decode");
    String::from_utf8(bytes).expect("utf8 svg")
}

#[test]
fn stroke_exports_as_closed_filled_outline() {
    let mut pad = svg_pad(PadOptions::default());
    pad.pointer_down(10.0, 45.0, 0.0);
    pad.pointer_move(50.0, 40.0, 20.0);
    pad.pointer_move(90.0, 50.0, 40.0);
    pad.pointer_up(130.0, 45.0, 60.0);

    let svg = decoded_svg(&pad);
    assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\""));
    assert!(svg.contains("viewBox=\"0 0 160.0 90.0\""));
    assert!(svg.contains("<path d=\"M "));
    assert!(svg.contains("Z\" fill=\"#000000\""));
}

#[test]
fn tap_exports_as_a_circle() {
    let mut pad = svg_pad(PadOptions::default());
    pad.pointer_down(80.0, 45.0, 0.0);
    pad.pointer_up(80.0, 45.0, 30.0);

    let svg = decoded_svg(&pad);
    assert!(svg.contains("<circle cx=\"80.00\" cy=\"45.00\""));
    assert!(!svg.contains("<path"));
}

#[test]
fn configured_color_join_and_cap_are_recorded() {
    let mut options = PadOptions::default();
    options.line_color = PadColor::rgba(0x11, 0x22, 0x33, 255);
    options.line_cap = LineCap::Butt;
    let mut pad = svg_pad(options);
    pad.pointer_down(10.0, 10.0, 0.0);
    pad.pointer_move(60.0, 30.0, 20.0);
    pad.pointer_up(110.0, 10.0, 40.0);

    let svg = decoded_svg(&pad);
    assert!(svg.contains("fill=\"#112233\""));
    assert!(svg.contains("stroke-linejoin=\"round\""));
    assert!(svg.contains("stroke-linecap=\"butt\""));
    // Butt caps add no endpoint circles.
    assert!(!svg.contains("<circle"));
}

#[test]
fn every_committed_stroke_appears_in_the_document() {
    let mut pad = svg_pad(PadOptions::default());
    for row in 0..3 {
        let y = 20.0 + row as f32 * 25.0;
        let t0 = row as f64 * 100.0;
        pad.pointer_down(10.0, y, t0);
        pad.pointer_move(80.0, y, t0 + 20.0);
        pad.pointer_up(150.0, y, t0 + 40.0);
    }

    let svg = decoded_svg(&pad);
    assert_eq!(svg.matches("<path").count(), 3);
}

#[test]
fn outline_width_tracks_the_pen_width() {
    // A slow stroke must produce a wider outline than a fast one.
    let outline_span = |dt_ms: f64| {
        let mut pad = svg_pad(PadOptions {
            smoothness: 1,
            ..PadOptions::default()
        });
        pad.pointer_down(10.0, 45.0, 0.0);
        pad.pointer_move(70.0, 45.0, dt_ms);
        pad.pointer_up(130.0, 45.0, dt_ms * 2.0);
        let svg = decoded_svg(&pad);

        // Take the vertical span of the outline near the stroke's tail,
        // where the width reflects the measured speed (the touch-down point
        // always starts at max thickness).
        let path = svg
            .split("d=\"")
            .nth(1)
            .and_then(|rest| rest.split('"').next())
            .expect("path data");
        let mut ys = Vec::new();
        for token in path.split_whitespace() {
            if let Some((x, y)) = token.split_once(',') {
                if let (Ok(x), Ok(y)) = (x.parse::<f32>(), y.parse::<f32>()) {
                    if x > 100.0 {
                        ys.push(y);
                    }
                }
            }
        }
        let min = ys.iter().copied().fold(f32::INFINITY, f32::min);
        let max = ys.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        max - min
    };

    let slow = outline_span(600.0);
    let fast = outline_span(20.0);
    assert!(
        slow > fast,
        "slow stroke outline ({slow}) should be wider than fast ({fast})"
    );
}
