//! ASCII waveform rendering of the saved audio

/// Render the min/max envelope of `samples` as `height` rows of `width`
/// characters. Amplitudes are scaled to the signal peak; silence renders as
/// a flat centre line.
pub fn render_waveform(samples: &[f32], width: usize, height: usize) -> String {
    let width = width.max(1);
    let height = height.max(3) | 1; // odd, so there is a centre row
    let centre = height / 2;

    let mut grid = vec![vec![' '; width]; height];
    for cell in grid[centre].iter_mut() {
        *cell = '-';
    }

    if !samples.is_empty() {
        let peak = samples.iter().fold(0.0f32, |a, s| a.max(s.abs()));
        let scale = if peak > 1e-9 { 1.0 / peak } else { 0.0 };

        for column in 0..width {
            let start = column * samples.len() / width;
            let end = ((column + 1) * samples.len() / width).max(start + 1).min(samples.len());
            if start >= samples.len() {
                break;
            }

            let (lo, hi) = samples[start..end]
                .iter()
                .fold((f32::MAX, f32::MIN), |(lo, hi), &s| (lo.min(s), hi.max(s)));

            let top = row_for(hi * scale, centre);
            let bottom = row_for(lo * scale, centre);
            for row in grid.iter_mut().take(bottom + 1).skip(top) {
                row[column] = '|';
            }
        }
    }

    grid.into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Map a normalized amplitude in [-1, 1] to a grid row (row 0 is the top)
fn row_for(value: f32, centre: usize) -> usize {
    let offset = (value.clamp(-1.0, 1.0) * centre as f32).round() as isize;
    (centre as isize - offset) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_silence_is_flat() {
        let rendered = render_waveform(&[0.0; 100], 10, 5);
        let rows: Vec<&str> = rendered.lines().collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[2], "||||||||||");
        assert!(rows[0].trim().is_empty());
        assert!(rows[4].trim().is_empty());
    }

    #[test]
    fn test_empty_input() {
        let rendered = render_waveform(&[], 8, 3);
        assert_eq!(rendered, "        \n--------\n        ");
    }

    #[test]
    fn test_full_scale_reaches_edges() {
        let samples: Vec<f32> = (0..200).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let rendered = render_waveform(&samples, 20, 7);
        let rows: Vec<&str> = rendered.lines().collect();
        assert_eq!(rows.len(), 7);
        assert!(rows[0].chars().all(|c| c == '|'));
        assert!(rows[6].chars().all(|c| c == '|'));
    }

    #[test]
    fn test_even_height_is_rounded_up() {
        let rendered = render_waveform(&[0.5; 10], 4, 4);
        assert_eq!(rendered.lines().count(), 5);
    }
}
