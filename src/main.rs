use eframe::egui;
use signature_pad::gui::{PadApp, SETTINGS_FILE};
use signature_pad::logging;
use signature_pad::settings::Settings;

fn main() -> anyhow::Result<()> {
    let settings = Settings::load(SETTINGS_FILE)?;
    logging::init(settings.debug_logging);

    let size = settings.window_size.unwrap_or((860.0, 560.0));
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([size.0, size.1])
            .with_min_inner_size([480.0, 320.0]),
        ..Default::default()
    };

    if let Err(err) = eframe::run_native(
        "Signature Pad",
        native_options,
        Box::new(move |_cc| Box::new(PadApp::new(settings))),
    ) {
        tracing::error!("window loop failed: {err}");
    }
    Ok(())
}
