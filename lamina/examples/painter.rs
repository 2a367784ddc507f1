//! Headless demo: runs a few frames of a small panel UI and prints the
//! draw commands a renderer would receive.
//!
//! ```sh
//! RUST_LOG=lamina=debug cargo run --example painter
//! ```

use lamina::{
    ClipKind, Color, DrawCommand, Gui, InputState, LayoutKind, Point, Rect, Renderer, SizeSpec,
};

struct Printer;

impl Renderer for Printer {
    fn render(&mut self, screen: Rect, layers: &[(i32, &[DrawCommand])]) {
        println!(
            "-- flush {}x{} ({} layers) --",
            screen.width,
            screen.height,
            layers.len()
        );
        for (z, commands) in layers {
            for command in *commands {
                println!("  [z {z}] {command:?}");
            }
        }
    }
}

fn toolbar(gui: &mut Gui) {
    gui.node()
        .width(SizeSpec::Percent(1.0))
        .height(40.0)
        .layout(LayoutKind::Row)
        .padding(6.0)
        .scope(|gui| {
            for label in ["open", "save", "run"] {
                let button = gui.node().width(72.0).height(SizeSpec::Percent(1.0)).id();
                let rect = gui.rect_of(button);
                let fill = Color::rgb8(58, 58, 70);
                gui.draw_rect_filled(rect, fill, 4.0);
                gui.draw_text(label, 14.0, rect.origin() + Point::new(10.0, 10.0), Color::WHITE);
            }
        });
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut gui = Gui::default();
    let screen = Rect::new(0.0, 0.0, 640.0, 360.0);

    let describe = |gui: &mut Gui| {
        gui.node()
            .width(SizeSpec::Percent(1.0))
            .height(SizeSpec::Percent(1.0))
            .layout(LayoutKind::Column)
            .scope(|gui| {
                toolbar(gui);

                // Content area clips whatever overflows it.
                gui.node()
                    .width(SizeSpec::Percent(1.0))
                    .height(SizeSpec::Percent(1.0))
                    .clip(ClipKind::Inner)
                    .padding(8.0)
                    .scope(|gui| {
                        let rect = gui.current_inner_rect();
                        gui.draw_rect(rect, Color::rgb8(90, 90, 110), 1.0, 0.0);
                        gui.draw_text(
                            "lamina demo",
                            16.0,
                            rect.origin() + Point::new(12.0, 12.0),
                            Color::rgb8(220, 220, 230),
                        );
                    });
            });
    };

    for frame in 0..3 {
        let report = gui.frame(screen, 1.0 / 60.0, InputState::default(), describe);
        println!(
            "frame {frame}: dirty={} layout_runs={} nodes={} commands={}",
            report.dirty, report.layout_runs, report.live_nodes, report.commands
        );
    }

    let mut printer = Printer;
    gui.present(&mut printer);
}
