use std::f32::consts::PI;

/// Adaptive one-euro low-pass filter over a single scalar channel.
#[derive(Debug, Clone, Copy)]
pub struct EuroFilter {
    min_cutoff: f32,
    beta: f32,
    d_cutoff: f32,
    hz: f32,
    x_prev: f32,
    dx_prev: f32,
    t_prev: f64,
    initialized: bool,
}

impl Default for EuroFilter {
    fn default() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.5,
            d_cutoff: 1.0,
            hz: 30.0,
            x_prev: 0.0,
            dx_prev: 0.0,
            t_prev: 0.0,
            initialized: false,
        }
    }
}

impl EuroFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_with_config(min_cutoff: f32, beta: f32, d_cutoff: f32, hz: f32) -> Self {
        Self {
            min_cutoff,
            beta,
            d_cutoff,
            hz,
            ..Default::default()
        }
    }

    /// Smoothing coefficient for a first-order low pass with the given cutoff over `dt` seconds.
    fn alpha(dt: f32, cutoff: f32) -> f32 {
        let r = 2.0 * PI * cutoff * dt;
        r / (r + 1.0)
    }

    fn low_pass(hat_x_prev: &mut f32, x: f32, alpha: f32) -> f32 {
        let hat_x = alpha * x + (1.0 - alpha) * *hat_x_prev;
        *hat_x_prev = hat_x;
        hat_x
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn value(&self) -> f32 {
        self.x_prev
    }

    /// Filters `x` observed at `t` seconds.
    pub fn filter_at(&mut self, x: f32, t: f64) -> f32 {
        if !x.is_finite() {
            return self.x_prev;
        }

        if !self.initialized {
            self.reset_to(x, t);
            return x;
        }

        let dt = (t - self.t_prev) as f32;
        if dt <= 0.0 {
            return self.x_prev;
        }
        self.t_prev = t;

        let dx = (x - self.x_prev) / dt;
        let edx = Self::low_pass(&mut self.dx_prev, dx, Self::alpha(dt, self.d_cutoff));
        let cutoff = self.min_cutoff + self.beta * edx.abs();

        Self::low_pass(&mut self.x_prev, x, Self::alpha(dt, cutoff))
    }

    /// Filters `x` assuming it arrived one nominal period after the previous sample.
    pub fn filter(&mut self, x: f32) -> f32 {
        let t = if self.initialized {
            self.t_prev + 1.0 / self.hz as f64
        } else {
            0.0
        };
        self.filter_at(x, t)
    }

    /// Re-seeds the filter at `x` with no velocity.
    pub fn reset_to(&mut self, x: f32, t: f64) {
        self.initialized = true;
        self.x_prev = x;
        self.dx_prev = 0.0;
        self.t_prev = t;
    }
}
