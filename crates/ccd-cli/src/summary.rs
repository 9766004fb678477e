use std::time::Duration;

use ccd_core::pipeline::config::{InputKind, PipelineConfig};
use ccd_core::pipeline::PipelineSummary;
use console::Style;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    disabled: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            disabled: Style::new().dim().yellow(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_denoise_summary(config: &PipelineConfig) {
    let s = Styles::new();
    let params = &config.denoise;

    println!();
    println!("  {}", s.title.apply_to("Camcorder Color Denoise"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(23)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Input"),
        s.path.apply_to(config.input.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(config.output.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Kind"),
        s.value.apply_to(InputKind::from_path(&config.input))
    );
    println!();

    println!("  {}", s.header.apply_to("Kernel"));
    if params.threshold == 0.0 {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Threshold"),
            s.disabled.apply_to("0 (pass-through)")
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Threshold"),
            s.value.apply_to(params.threshold)
        );
    }
    println!(
        "    {:<12}{}",
        s.label.apply_to("Radius"),
        s.value.apply_to(format!("{} px", params.geometry.radius))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Step"),
        s.value.apply_to(format!("{} px", params.geometry.step))
    );
    if InputKind::from_path(&config.input) == InputKind::Video {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Batch"),
            s.value.apply_to(format!("{} frames", config.batch_size))
        );
    }
    println!();
}

pub fn print_run_result(summary: &PipelineSummary, elapsed: Duration) {
    let s = Styles::new();

    println!();
    println!(
        "  {:<14}{}",
        s.label.apply_to("Processed"),
        s.value.apply_to(format!(
            "{} frame(s) at {}x{}",
            summary.frames, summary.width, summary.height
        ))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Elapsed"),
        s.value.apply_to(format!("{:.2}s", elapsed.as_secs_f64()))
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Saved to"),
        s.path.apply_to(summary.output.display())
    );
    println!();
}
