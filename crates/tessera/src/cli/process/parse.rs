//! Value parsers for the `process` flags.
//!
//! Each parser has the `fn(&str) -> Result<T, String>` shape clap accepts
//! as a `value_parser`, so malformed flags are reported before any work.

use tessera_core::operation::{Crop, ScaleConstraint, ScaleMode};
use tessera_core::types::Rect;

/// `x,y,w,h` with non-negative numbers and a non-zero extent.
pub fn parse_rect(s: &str) -> Result<Rect, String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [x, y, w, h] = parts.as_slice() else {
        return Err(format!("expected x,y,w,h but got '{s}'"));
    };
    let number = |v: &str| {
        v.parse::<f64>()
            .ok()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .ok_or_else(|| format!("'{v}' is not a non-negative number"))
    };
    let rect = Rect::new(number(*x)?, number(*y)?, number(*w)?, number(*h)?);
    if rect.is_empty() {
        return Err(format!("region '{s}' has no area"));
    }
    Ok(rect)
}

/// `full`, `square`, `x,y,w,h` (pixels) or `pct:x,y,w,h` (percent).
pub fn parse_region(s: &str) -> Result<Crop, String> {
    match s.trim() {
        "full" => Ok(Crop::full()),
        "square" => Ok(Crop::square()),
        other => match other.strip_prefix("pct:") {
            Some(percent) => {
                let r = parse_rect(percent)?;
                Ok(Crop::percent(
                    r.x / 100.0,
                    r.y / 100.0,
                    r.width / 100.0,
                    r.height / 100.0,
                ))
            }
            None => {
                let r = parse_rect(other)?;
                Ok(Crop::pixels(r.x, r.y, r.width, r.height))
            }
        },
    }
}

/// `full`, `max`, `w,`, `,h`, `pct:n`, `w,h` (exact) or `!w,h` (fit inside).
pub fn parse_size(s: &str) -> Result<ScaleMode, String> {
    let s = s.trim();
    let length = |v: &str| {
        v.trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("'{v}' is not a positive integer"))
    };

    match s {
        "full" => return Ok(ScaleMode::Full),
        "max" => return Ok(ScaleMode::Max),
        _ => {}
    }
    if let Some(percent) = s.strip_prefix("pct:") {
        let p = percent
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|p| p.is_finite() && *p > 0.0)
            .ok_or_else(|| format!("'{percent}' is not a positive percentage"))?;
        return Ok(ScaleMode::Percent(p / 100.0));
    }

    let (fit, dims) = match s.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let Some((w, h)) = dims.split_once(',') else {
        return Err(format!("unrecognized size '{s}'"));
    };
    match (w.trim().is_empty(), h.trim().is_empty(), fit) {
        (false, true, false) => Ok(ScaleMode::ByWidth(length(w)?)),
        (true, false, false) => Ok(ScaleMode::ByHeight(length(h)?)),
        (false, false, false) => Ok(ScaleMode::NonAspectFill {
            width: length(w)?,
            height: length(h)?,
        }),
        (false, false, true) => Ok(ScaleMode::AspectFitInside {
            width: length(w)?,
            height: length(h)?,
        }),
        _ => Err(format!("unrecognized size '{s}'")),
    }
}

/// `n:d`, a ratio no greater than one.
pub fn parse_scale_constraint(s: &str) -> Result<ScaleConstraint, String> {
    let (n, d) = s
        .split_once(':')
        .ok_or_else(|| format!("expected n:d but got '{s}'"))?;
    let n = n.trim().parse::<u32>().map_err(|e| format!("'{n}': {e}"))?;
    let d = d.trim().parse::<u32>().map_err(|e| format!("'{d}': {e}"))?;
    ScaleConstraint::new(n, d).map_err(|e| e.to_string())
}
