//! Writes a synthetic pair of ToF-SIMS images (`sample_si.png`,
//! `sample_total.png`) of a film with a thickness gradient and a bump.
//!
//! The Si signal follows `counts = a * exp(b * thickness)`, so the thickness
//! map can be recovered in the app with the printed factors and `(a, b)`.

use anyhow::{Context, Result};
use image::{GrayImage, Luma};

const WIDTH: u32 = 128;
const HEIGHT: u32 = 128;

/// Si counts on bare silicon and attenuation per nm.
const A: f64 = 33.0;
const B: f64 = -0.998;

/// Mean total-ion counts per pixel.
const TOTAL_MEAN: f64 = 8000.0;

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Film thickness in nm at pixel (col, row).
fn thickness(col: u32, row: u32) -> f64 {
    let x = col as f64 / (WIDTH - 1) as f64;
    let y = row as f64 / (HEIGHT - 1) as f64;
    let gradient = 0.5 + 2.5 * x;
    let r = ((x - 0.6).powi(2) + (y - 0.4).powi(2)).sqrt();
    gradient + gaussian(r, 0.0, 0.12, 1.5)
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// Counting noise: normal approximation of a Poisson draw.
    fn counts(&mut self, mean: f64) -> f64 {
        self.gauss(mean, mean.sqrt()).max(0.0)
    }
}

/// Quantize counts to 8 bits with `full_scale` counts mapping to 255.
fn to_pixel(counts: f64, full_scale: f64) -> Luma<u8> {
    Luma([(counts / full_scale * 255.0).round().clamp(0.0, 255.0) as u8])
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let mut si_counts = vec![0.0; (WIDTH * HEIGHT) as usize];
    let mut total_counts = vec![0.0; (WIDTH * HEIGHT) as usize];
    for row in 0..HEIGHT {
        for col in 0..WIDTH {
            let idx = (row * WIDTH + col) as usize;
            si_counts[idx] = rng.counts(A * (B * thickness(col, row)).exp());
            // sputter yield drifts slowly across the field of view
            let yield_factor = 1.0 + 0.05 * (col as f64 / WIDTH as f64 - 0.5);
            total_counts[idx] = rng.counts(TOTAL_MEAN * yield_factor);
        }
    }

    let si_max = si_counts.iter().cloned().fold(f64::MIN, f64::max);
    let total_max = total_counts.iter().cloned().fold(f64::MIN, f64::max);

    let si = GrayImage::from_fn(WIDTH, HEIGHT, |col, row| {
        to_pixel(si_counts[(row * WIDTH + col) as usize], si_max)
    });
    let total = GrayImage::from_fn(WIDTH, HEIGHT, |col, row| {
        to_pixel(total_counts[(row * WIDTH + col) as usize], total_max)
    });

    si.save("sample_si.png").context("writing sample_si.png")?;
    total.save("sample_total.png").context("writing sample_total.png")?;

    println!("Wrote sample_si.png and sample_total.png ({WIDTH}x{HEIGHT})");
    println!("Counts/pixel factor (Si image):    {:.5}", si_max / 255.0);
    println!("Counts/pixel factor (total image): {:.5}", total_max / 255.0);
    println!("Pixel/raster factor: 1    coefficients: a = {A}, b = {B}");
    Ok(())
}
