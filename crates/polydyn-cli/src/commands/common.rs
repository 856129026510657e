//! Shared CLI helpers used across multiple commands.

/// Parse a `key=value` string for clap's `value_parser`.
pub fn parse_key_val(s: &str) -> Result<(String, f32), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("Invalid parameter format: '{}' (expected key=value)", s))?;
    let value = value
        .trim()
        .parse::<f32>()
        .map_err(|_| format!("Invalid value for '{}': '{}' is not a number", key, value))?;
    Ok((key.trim().to_string(), value))
}

/// Parse a comma-separated list of MIDI note numbers, e.g. `"60,64,67"`.
pub fn parse_notes(s: &str) -> Result<Vec<u8>, String> {
    let notes = s
        .split(',')
        .filter(|part| !part.trim().is_empty())
        .map(|part| {
            part.trim()
                .parse::<u8>()
                .ok()
                .filter(|&n| n <= 127)
                .ok_or_else(|| format!("Invalid MIDI note: '{}' (expected 0-127)", part.trim()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if notes.is_empty() {
        return Err("No MIDI notes provided. Use format: --notes \"60,64,67\"".to_string());
    }
    Ok(notes)
}

/// Running peak and RMS of rendered interleaved stereo.
#[derive(Debug, Default, Clone, Copy)]
pub struct LevelMeter {
    peak: f32,
    sum_squares: f64,
    samples: usize,
    clipped: usize,
}

impl LevelMeter {
    /// Accumulate a block.
    pub fn add(&mut self, block: &[f32]) {
        for &x in block {
            let a = x.abs();
            self.peak = self.peak.max(a);
            self.sum_squares += f64::from(x) * f64::from(x);
            if a > 1.0 {
                self.clipped += 1;
            }
        }
        self.samples += block.len();
    }

    /// Largest absolute sample.
    pub fn peak(&self) -> f32 {
        self.peak
    }

    /// Root mean square over everything added.
    pub fn rms(&self) -> f32 {
        if self.samples == 0 {
            return 0.0;
        }
        (self.sum_squares / self.samples as f64).sqrt() as f32
    }

    /// Samples whose magnitude exceeded full scale.
    pub fn clipped(&self) -> usize {
        self.clipped
    }
}
