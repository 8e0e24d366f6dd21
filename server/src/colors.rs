// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.

// A palette of 20 distinct colors, handed out in order to categories created
// without an explicit color.
const PALETTE: [&str; 20] = [
    "#1f77b4", // Muted blue
    "#ff7f0e", // Orange
    "#2ca02c", // Green
    "#d62728", // Red
    "#9467bd", // Purple
    "#8c564b", // Brown
    "#e377c2", // Pink
    "#7f7f7f", // Grey
    "#bcbd22", // Olive
    "#17becf", // Cyan
    "#aec7e8", // Light blue
    "#ffbb78", // Light orange
    "#98df8a", // Light green
    "#ff9896", // Light red
    "#c5b0d5", // Light purple
    "#c49c94", // Light brown
    "#f7b6d2", // Light pink
    "#c7c7c7", // Light grey
    "#dbdb8d", // Light olive
    "#9edae5", // Light cyan
];

/// Color for the next category, given how many categories already exist.
/// Wraps around once the palette is exhausted.
pub fn default_color_for(existing_categories: i64) -> &'static str {
    let index = existing_categories.rem_euclid(PALETTE.len() as i64) as usize;
    PALETTE[index]
}
