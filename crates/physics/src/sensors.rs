//! Encoder sensors.
//!
//! An encoder reports the position and velocity of one joint. Readings are
//! refreshed by the engine at the sensors update period and go through the
//! measurement model of [`EncoderOptions`].

use crate::options::EncoderOptions;

#[derive(Clone, Debug)]
pub(crate) struct EncoderSensor {
    pub name: String,
    pub joint: usize,
}

impl EncoderSensor {
    pub(crate) fn measure(
        &self,
        q: &[f64],
        v: &[f64],
        options: &EncoderOptions,
        rng: &mut fastrand::Rng,
    ) -> [f64; 2] {
        let mut reading = [q[self.joint] + options.bias, v[self.joint]];
        if options.noise_std > 0.0 {
            for value in &mut reading {
                *value += options.noise_std * standard_normal(rng);
            }
        }
        reading
    }
}

/// Box–Muller transform over two uniform draws.
fn standard_normal(rng: &mut fastrand::Rng) -> f64 {
    // `1 - u` keeps the logarithm away from zero.
    let u1 = 1.0 - rng.f64();
    let u2 = rng.f64();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}
