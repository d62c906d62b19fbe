//! LED strip rendering — pure function from volume state to a pixel buffer.
//!
//! The rendered bar has three zones: a decaying trail at the bottom of the
//! strip, a solid segment behind the head, and an anti-aliased head pixel
//! whose brightness encodes the sub-pixel volume position. Every frame is a
//! full repaint; nothing is diffed against the previous buffer.
//!
//! All intensity math happens on `[0, 1]` scalars which are gamma-corrected
//! once, at the point a color is produced. The default gamma of 2.8
//! compensates for the perceptual non-linearity of typical strip LEDs.

use crate::color::Rgb;
use crate::mixer::{VolumeRange, VolumeState};

/// Rendering parameters. Immutable for the process lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Bar color when unmuted.
    pub color: Rgb,
    /// Fill color when muted.
    pub mute_color: Rgb,
    /// Peak intensity of the head and solid segment, `(0, 1]`.
    pub intensity: f64,
    /// Floor intensity of the trail; the trail never goes fully dark.
    pub min_intensity: f64,
    /// Intensity of the mute fill.
    pub mute_intensity: f64,
    /// Gamma exponent applied to every scalar intensity.
    pub gamma: f64,
    /// Width in pixels of the solid segment behind the head.
    pub head_width: f64,
    /// Distance in pixels behind the head at which the trail has decayed to
    /// the floor. Must exceed `head_width`.
    pub end_width: f64,
    /// Number of pixels on the strip.
    pub strip_length: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            color: Rgb::new(0x00, 0xFF, 0x28), // jade
            mute_color: Rgb::new(0xFF, 0x00, 0x00),
            intensity: 0.3,
            min_intensity: 0.02,
            mute_intensity: 0.3,
            gamma: 2.8,
            head_width: 1.3,
            end_width: 4.0,
            strip_length: 12,
        }
    }
}

impl RenderConfig {
    /// Check the numeric invariants the renderer relies on.
    pub fn validate(&self) -> std::result::Result<(), String> {
        if self.strip_length == 0 {
            return Err("strip_length must be at least 1".into());
        }
        if !(self.intensity > 0.0 && self.intensity <= 1.0) {
            return Err(format!("intensity {} not in (0, 1]", self.intensity));
        }
        if !(0.0..=1.0).contains(&self.min_intensity) {
            return Err(format!("min_intensity {} not in [0, 1]", self.min_intensity));
        }
        if !(0.0..=1.0).contains(&self.mute_intensity) {
            return Err(format!(
                "mute_intensity {} not in [0, 1]",
                self.mute_intensity
            ));
        }
        if !(self.gamma > 0.0) {
            return Err(format!("gamma {} must be positive", self.gamma));
        }
        if !(self.head_width > 0.0) {
            return Err(format!("head_width {} must be positive", self.head_width));
        }
        if self.head_width >= self.end_width {
            return Err(format!(
                "head_width {} must be less than end_width {}",
                self.head_width, self.end_width
            ));
        }
        Ok(())
    }
}

/// Ordered RGB pixels, index 0 at the bottom of the strip.
pub type PixelBuffer = Vec<Rgb>;

/// Gamma-correct a scalar intensity and apply it to a color.
fn shade(color: Rgb, intensity: f64, gamma: f64) -> Rgb {
    let corrected = intensity.clamp(0.0, 1.0).powf(gamma);
    Rgb::new(
        (f64::from(color.r) * corrected).round() as u8,
        (f64::from(color.g) * corrected).round() as u8,
        (f64::from(color.b) * corrected).round() as u8,
    )
}

/// Exact area under the trail ramp over `[a, b)`.
///
/// The ramp rises linearly from 0 at `end_pos` to 1 at `tail_pos` and is 0
/// below `end_pos`. Callers only ask about intervals with `b <= tail_pos`,
/// so the upper clamp never engages.
fn ramp_area(a: f64, b: f64, end_pos: f64, tail_pos: f64) -> f64 {
    let lo = a.max(end_pos);
    if lo >= b {
        return 0.0;
    }
    let width = tail_pos - end_pos;
    let va = (lo - end_pos) / width;
    let vb = (b - end_pos) / width;
    (b - lo) * 0.5 * (va + vb)
}

/// Render one frame. Pure and deterministic: identical inputs produce a
/// bit-identical buffer. Total over all valid states; no error path.
pub fn render(state: VolumeState, range: VolumeRange, cfg: &RenderConfig) -> PixelBuffer {
    let n = cfg.strip_length;

    if state.muted {
        return vec![shade(cfg.mute_color, cfg.mute_intensity, cfg.gamma); n];
    }

    // Continuous head position on the strip, in pixels.
    let head_pos = (state.volume - range.min) as f64 / range.span() as f64 * n as f64;
    let (head_index, head_frac) = if head_pos >= n as f64 {
        (n - 1, 1.0)
    } else {
        (head_pos.floor() as usize, head_pos.fract())
    };

    let tail_pos = head_pos - cfg.head_width;
    let end_pos = head_pos - cfg.end_width;
    let tail_index = tail_pos.floor();

    let mut buf = vec![Rgb::BLACK; n];

    // Decaying trail below the boundary pixel.
    let mut i = 0usize;
    while (i as f64) < tail_index && i < n {
        let coverage = ramp_area(i as f64, (i + 1) as f64, end_pos, tail_pos);
        let level = (coverage * cfg.intensity).max(cfg.min_intensity);
        buf[i] = shade(cfg.color, level, cfg.gamma);
        i += 1;
    }

    // Boundary pixel: part ramp, part solid segment.
    if tail_index >= 0.0 && (tail_index as usize) < n {
        let t = tail_index as usize;
        let coverage =
            ramp_area(t as f64, tail_pos, end_pos, tail_pos) + ((t + 1) as f64 - tail_pos);
        let level = (coverage * cfg.intensity).max(cfg.min_intensity);
        buf[t] = shade(cfg.color, level, cfg.gamma);
    }

    // Solid segment up to (exclusive) the head pixel.
    let solid_start = if tail_index < 0.0 {
        0
    } else {
        tail_index as usize + 1
    };
    for pixel in buf.iter_mut().take(head_index).skip(solid_start) {
        *pixel = shade(cfg.color, cfg.intensity, cfg.gamma);
    }

    // Anti-aliased head; pixels above it stay black.
    buf[head_index] = shade(cfg.color, cfg.intensity * head_frac, cfg.gamma);

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> RenderConfig {
        RenderConfig {
            strip_length: 10,
            head_width: 1.6,
            end_width: 4.0,
            ..RenderConfig::default()
        }
    }

    fn range() -> VolumeRange {
        VolumeRange { min: 0, max: 100 }
    }

    fn unmuted(volume: i64) -> VolumeState {
        VolumeState {
            volume,
            muted: false,
        }
    }

    fn full(cfg: &RenderConfig) -> Rgb {
        shade(cfg.color, cfg.intensity, cfg.gamma)
    }

    // ── purity / idempotence ──

    #[test]
    fn render_is_deterministic() {
        let cfg = test_config();
        for volume in [0, 10, 37, 50, 99, 100] {
            let a = render(unmuted(volume), range(), &cfg);
            let b = render(unmuted(volume), range(), &cfg);
            assert_eq!(a, b, "non-deterministic at volume {volume}");
        }
    }

    // ── scenario A: headPos lands exactly on a pixel boundary ──

    #[test]
    fn scenario_head_on_pixel_boundary() {
        let cfg = test_config();
        let buf = render(unmuted(10), range(), &cfg);
        // headPos = 1.0, tailPos = -0.6: decay loop skipped entirely.
        assert_eq!(buf[0], full(&cfg), "pixel 0 fully lit");
        assert_eq!(buf[1], Rgb::BLACK, "head pixel unlit at frac 0");
        for (i, px) in buf.iter().enumerate().skip(2) {
            assert_eq!(*px, Rgb::BLACK, "pixel {i} beyond head must be unlit");
        }
    }

    // ── scenario B: volume at max ──

    #[test]
    fn scenario_volume_at_max() {
        let cfg = test_config();
        let buf = render(unmuted(100), range(), &cfg);
        // headPos = 10 >= strip_length: head pinned to last pixel, fully lit.
        assert_eq!(buf[9], full(&cfg), "top pixel fully lit at max volume");
    }

    #[test]
    fn no_dark_pixels_at_max_volume() {
        // Linear gamma so the floor intensity survives u8 quantization.
        let cfg = RenderConfig {
            gamma: 1.0,
            ..test_config()
        };
        let buf = render(unmuted(100), range(), &cfg);
        assert!(
            buf.iter().all(|px| *px != Rgb::BLACK),
            "no pixel is dark at max volume"
        );
    }

    // ── scenario C: mute dominance ──

    #[test]
    fn scenario_mute_dominates_volume() {
        let cfg = test_config();
        let muted_a = render(
            VolumeState {
                volume: 5,
                muted: true,
            },
            range(),
            &cfg,
        );
        let muted_b = render(
            VolumeState {
                volume: 95,
                muted: true,
            },
            range(),
            &cfg,
        );
        assert_eq!(muted_a, muted_b);
        let fill = shade(cfg.mute_color, cfg.mute_intensity, cfg.gamma);
        assert!(muted_a.iter().all(|px| *px == fill));
    }

    // ── edge cases ──

    #[test]
    fn volume_at_min_is_dark() {
        let cfg = test_config();
        let buf = render(unmuted(0), range(), &cfg);
        // headPos = 0, headFrac = 0: no lit head segment at all.
        assert!(buf.iter().all(|px| *px == Rgb::BLACK));
    }

    #[test]
    fn negative_range_minimum() {
        let cfg = test_config();
        let r = VolumeRange {
            min: -100,
            max: 900,
        };
        let buf = render(unmuted(900), r, &cfg);
        assert_eq!(buf[9], full(&cfg));
        let low = render(unmuted(-100), r, &cfg);
        assert!(low.iter().all(|px| *px == Rgb::BLACK));
    }

    #[test]
    fn buffer_length_matches_strip() {
        let mut cfg = test_config();
        for n in [1, 3, 12, 60] {
            cfg.strip_length = n;
            assert_eq!(render(unmuted(50), range(), &cfg).len(), n);
            assert_eq!(
                render(
                    VolumeState {
                        volume: 50,
                        muted: true
                    },
                    range(),
                    &cfg
                )
                .len(),
                n
            );
        }
    }

    // ── trail shape ──

    #[test]
    fn trail_sits_at_flat_floor() {
        // Linear gamma so the floor intensity survives u8 quantization.
        let cfg = RenderConfig {
            gamma: 1.0,
            ..test_config()
        };
        let buf = render(unmuted(100), range(), &cfg);
        let floor = shade(cfg.color, cfg.min_intensity, cfg.gamma);
        assert_ne!(floor, Rgb::BLACK);
        // Pixels far below the head sit at the flat floor.
        assert_eq!(buf[0], floor);
        assert_eq!(buf[1], floor);
    }

    #[test]
    fn trail_decays_towards_floor() {
        let cfg = RenderConfig {
            strip_length: 20,
            head_width: 1.0,
            end_width: 8.0,
            gamma: 1.0, // linear so channel values mirror intensities
            ..RenderConfig::default()
        };
        let buf = render(unmuted(100), range(), &cfg);
        // Green channel (dominant in jade) must be non-increasing moving
        // away from the head through the trail.
        let head_index = 19;
        for i in 1..head_index {
            assert!(
                buf[i - 1].g <= buf[i].g,
                "trail not monotone at pixel {i}: {} > {}",
                buf[i - 1].g,
                buf[i].g
            );
        }
    }

    #[test]
    fn boundary_pixel_blends_between_trail_and_solid() {
        let cfg = RenderConfig {
            strip_length: 20,
            head_width: 1.5,
            end_width: 6.0,
            gamma: 1.0,
            ..RenderConfig::default()
        };
        let buf = render(unmuted(80), range(), &cfg);
        // headPos = 16, tailPos = 14.5, boundary pixel = 14.
        let boundary = buf[14];
        let below = buf[13];
        let solid = buf[15];
        assert!(boundary.g > below.g, "boundary brighter than ramp below it");
        assert!(boundary.g <= solid.g, "boundary not brighter than solid");
    }

    // ── monotonicity ──

    #[test]
    fn fully_lit_count_is_monotone_in_volume() {
        let cfg = test_config();
        let lit = full(&cfg);
        let count = |v: i64| {
            render(unmuted(v), range(), &cfg)
                .iter()
                .filter(|px| **px == lit)
                .count()
        };
        let mut prev = count(0);
        for v in 1..=100 {
            let cur = count(v);
            assert!(cur >= prev, "lit count dropped from {prev} to {cur} at {v}");
            prev = cur;
        }
    }

    // ── gamma ──

    #[test]
    fn shade_zero_is_black_and_one_is_full() {
        let c = Rgb::new(200, 100, 50);
        assert_eq!(shade(c, 0.0, 2.8), Rgb::BLACK);
        assert_eq!(shade(c, 1.0, 2.8), c);
    }

    #[test]
    fn shade_clamps_out_of_range_scalars() {
        let c = Rgb::new(200, 100, 50);
        assert_eq!(shade(c, -0.5, 2.8), Rgb::BLACK);
        assert_eq!(shade(c, 1.5, 2.8), c);
    }

    #[test]
    fn gamma_dims_midrange_intensities() {
        let c = Rgb::new(0, 255, 0);
        let linear = shade(c, 0.5, 1.0);
        let corrected = shade(c, 0.5, 2.8);
        assert!(corrected.g < linear.g);
    }

    #[test]
    fn channels_never_exceed_base_color() {
        let cfg = test_config();
        for v in (0..=100).step_by(7) {
            for px in render(unmuted(v), range(), &cfg) {
                assert!(px.r <= cfg.color.r);
                assert!(px.g <= cfg.color.g);
                assert!(px.b <= cfg.color.b);
            }
        }
    }

    // ── ramp_area ──

    #[test]
    fn ramp_area_zero_below_end() {
        assert_eq!(ramp_area(0.0, 1.0, 2.0, 6.0), 0.0);
    }

    #[test]
    fn ramp_area_full_interval_inside_ramp() {
        // Ramp from 2.0 to 6.0; pixel [3, 4) averages (0.25 + 0.5) / 2.
        let area = ramp_area(3.0, 4.0, 2.0, 6.0);
        assert!((area - 0.375).abs() < 1e-12);
    }

    #[test]
    fn ramp_area_partial_interval_at_end() {
        // Pixel [1, 2) straddles end_pos = 1.5; only [1.5, 2) contributes.
        let area = ramp_area(1.0, 2.0, 1.5, 5.5);
        let expected = 0.5 * 0.5 * (0.0 + 0.125);
        assert!((area - expected).abs() < 1e-12);
    }

    // ── config validation ──

    #[test]
    fn default_config_is_valid() {
        assert!(RenderConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let base = RenderConfig::default();
        let cases: Vec<RenderConfig> = vec![
            RenderConfig {
                strip_length: 0,
                ..base.clone()
            },
            RenderConfig {
                intensity: 0.0,
                ..base.clone()
            },
            RenderConfig {
                intensity: 1.5,
                ..base.clone()
            },
            RenderConfig {
                min_intensity: -0.1,
                ..base.clone()
            },
            RenderConfig {
                gamma: 0.0,
                ..base.clone()
            },
            RenderConfig {
                head_width: 0.0,
                ..base.clone()
            },
            RenderConfig {
                head_width: 4.0,
                end_width: 4.0,
                ..base.clone()
            },
        ];
        for cfg in cases {
            assert!(cfg.validate().is_err(), "accepted invalid {cfg:?}");
        }
    }
}
