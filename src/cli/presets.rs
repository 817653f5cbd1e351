use crate::presets::PRESETS;

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("").trim()
}

pub fn run() {
    println!("Built-in presets (use with `generate --preset NAME`):");
    println!();
    for preset in PRESETS {
        println!("  {} ({} iterations)", preset.name, preset.iterations);
        println!("    Caption: {}", preset.caption);
        println!("    {}", first_line(preset.methodology));
        println!();
    }
}
