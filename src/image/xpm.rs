// src/image/xpm.rs

//! Minimal XPM3 decoder
//!
//! Pixmaps still ship icons as X PixMap files and no maintained crate decodes
//! them, so we parse the subset packages actually use: a values line, a
//! palette of `c` (color) entries with `#RRGGBB`/`#RRRRGGGGBBBB`/`None`
//! values plus a handful of named colors, and character-indexed pixel rows.

use image::{Rgba, RgbaImage};
use std::collections::HashMap;

/// Decode XPM source text into an RGBA image
pub fn decode(text: &str) -> Result<RgbaImage, String> {
    let strings = quoted_strings(text);
    if strings.is_empty() {
        return Err("no XPM data strings".to_string());
    }

    // "<width> <height> <ncolors> <chars-per-pixel>" (hotspot fields ignored)
    let values: Vec<&str> = strings[0].split_whitespace().collect();
    if values.len() < 4 {
        return Err(format!("malformed values line: '{}'", strings[0]));
    }
    let width: u32 = values[0].parse().map_err(|_| "bad width".to_string())?;
    let height: u32 = values[1].parse().map_err(|_| "bad height".to_string())?;
    let ncolors: usize = values[2].parse().map_err(|_| "bad color count".to_string())?;
    let cpp: usize = values[3]
        .parse()
        .map_err(|_| "bad chars-per-pixel".to_string())?;
    if width == 0 || height == 0 || cpp == 0 {
        return Err("empty pixmap".to_string());
    }
    if strings.len() < 1 + ncolors + height as usize {
        return Err("truncated XPM data".to_string());
    }

    let mut palette: HashMap<&str, Rgba<u8>> = HashMap::with_capacity(ncolors);
    for entry in &strings[1..1 + ncolors] {
        if entry.len() < cpp {
            return Err(format!("short palette entry: '{}'", entry));
        }
        let (symbol, spec) = entry.split_at(cpp);
        palette.insert(symbol, parse_color(spec)?);
    }

    let mut img = RgbaImage::new(width, height);
    for (y, row) in strings[1 + ncolors..1 + ncolors + height as usize]
        .iter()
        .enumerate()
    {
        if row.len() < width as usize * cpp {
            return Err(format!("short pixel row {}", y));
        }
        for x in 0..width as usize {
            let symbol = &row[x * cpp..(x + 1) * cpp];
            let color = palette
                .get(symbol)
                .ok_or_else(|| format!("unknown pixel symbol '{}'", symbol))?;
            img.put_pixel(x as u32, y as u32, *color);
        }
    }
    Ok(img)
}

/// Parse the color half of a palette entry, honoring only the `c` key
fn parse_color(spec: &str) -> Result<Rgba<u8>, String> {
    let tokens: Vec<&str> = spec.split_whitespace().collect();
    let mut i = 0;
    while i < tokens.len() {
        if tokens[i] == "c" && i + 1 < tokens.len() {
            return named_or_hex(tokens[i + 1]);
        }
        i += 1;
    }
    Err(format!("palette entry without color key: '{}'", spec))
}

fn named_or_hex(value: &str) -> Result<Rgba<u8>, String> {
    if let Some(hex) = value.strip_prefix('#') {
        return match hex.len() {
            6 => {
                let v = u32::from_str_radix(hex, 16).map_err(|_| format!("bad hex '{}'", value))?;
                Ok(Rgba([(v >> 16) as u8, (v >> 8) as u8, v as u8, 255]))
            }
            // 16-bit-per-channel form; keep the high byte of each channel
            12 => {
                let r = u16::from_str_radix(&hex[0..4], 16)
                    .map_err(|_| format!("bad hex '{}'", value))?;
                let g = u16::from_str_radix(&hex[4..8], 16)
                    .map_err(|_| format!("bad hex '{}'", value))?;
                let b = u16::from_str_radix(&hex[8..12], 16)
                    .map_err(|_| format!("bad hex '{}'", value))?;
                Ok(Rgba([(r >> 8) as u8, (g >> 8) as u8, (b >> 8) as u8, 255]))
            }
            _ => Err(format!("unsupported hex color '{}'", value)),
        };
    }
    match value.to_ascii_lowercase().as_str() {
        "none" => Ok(Rgba([0, 0, 0, 0])),
        "black" => Ok(Rgba([0, 0, 0, 255])),
        "white" => Ok(Rgba([255, 255, 255, 255])),
        "red" => Ok(Rgba([255, 0, 0, 255])),
        "green" => Ok(Rgba([0, 255, 0, 255])),
        "blue" => Ok(Rgba([0, 0, 255, 255])),
        "gray" | "grey" => Ok(Rgba([190, 190, 190, 255])),
        other => Err(format!("unsupported named color '{}'", other)),
    }
}

/// Collect the double-quoted data strings, ignoring the C scaffolding
fn quoted_strings(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut rest = text;
    while let Some(start) = rest.find('"') {
        let after = &rest[start + 1..];
        match after.find('"') {
            Some(end) => {
                out.push(&after[..end]);
                rest = &after[end + 1..];
            }
            None => break,
        }
    }
    out
}
