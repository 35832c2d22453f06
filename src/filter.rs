use enum_dispatch::*;

use serde::Deserialize;

/// Third-order IIR coefficients in direct form I.
///
/// `a` weights the current input and the three before it, `b` feeds back
/// the three previous outputs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Iir3Coefficients {
    pub a: [f64; 4],
    pub b: [f64; 3],
}

/// Butterworth low-pass, cutoff well below the meter report rate.
pub const BUTTERWORTH: Iir3Coefficients = Iir3Coefficients {
    a: [0.0285, 0.0855, 0.0855, 0.0285],
    b: [-1.6245, 1.1228, -0.2913],
};

/// Bessel low-pass with the same cutoff, slower but overshoot-free.
pub const BESSEL: Iir3Coefficients = Iir3Coefficients {
    a: [0.003621, 0.010863, 0.010863, 0.003621],
    b: [-2.2997, 1.7925, -0.4403],
};

#[enum_dispatch]
pub trait SignalFilter {
    /// Feed one raw sample through the filter, returning the smoothed value.
    fn apply(&mut self, raw: f64) -> f64;

    /// Clear all filter history.
    fn reset(&mut self);
}

#[enum_dispatch(SignalFilter)]
#[derive(Clone, Debug)]
pub enum Filter {
    MovingAverage(MovingAverage),
    Butterworth(Butterworth),
    Bessel(Bessel),
}

// MovingAverage {{{
/// Unweighted mean over the last three samples.
#[derive(Clone, Debug, Default)]
pub struct MovingAverage {
    x1: f64,
    x2: f64,
}

impl MovingAverage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalFilter for MovingAverage {
    fn apply(&mut self, raw: f64) -> f64 {
        let out = (raw + self.x1 + self.x2) / 3.0;
        self.x2 = self.x1;
        self.x1 = raw;
        out
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.x2 = 0.0;
    }
} // }}}

// Iir3State {{{
#[derive(Clone, Debug, Default)]
struct Iir3State {
    x: [f64; 3],
    y: [f64; 3],
}

impl Iir3State {
    fn step(&mut self, coefficients: &Iir3Coefficients, raw: f64) -> f64 {
        let a = &coefficients.a;
        let b = &coefficients.b;

        let out = a[0] * raw + a[1] * self.x[0] + a[2] * self.x[1] + a[3] * self.x[2]
            - b[0] * self.y[0]
            - b[1] * self.y[1]
            - b[2] * self.y[2];

        self.x = [raw, self.x[0], self.x[1]];
        self.y = [out, self.y[0], self.y[1]];

        out
    }

    fn reset(&mut self) {
        self.x = [0.0; 3];
        self.y = [0.0; 3];
    }
} // }}}

// Butterworth {{{
#[derive(Clone, Debug, Default)]
pub struct Butterworth {
    state: Iir3State,
}

impl Butterworth {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalFilter for Butterworth {
    fn apply(&mut self, raw: f64) -> f64 {
        self.state.step(&BUTTERWORTH, raw)
    }

    fn reset(&mut self) {
        self.state.reset();
    }
} // }}}

// Bessel {{{
#[derive(Clone, Debug, Default)]
pub struct Bessel {
    state: Iir3State,
}

impl Bessel {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SignalFilter for Bessel {
    fn apply(&mut self, raw: f64) -> f64 {
        self.state.step(&BESSEL, raw)
    }

    fn reset(&mut self) {
        self.state.reset();
    }
} // }}}

/// Filter selection as it appears in the config file.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    #[default]
    MovingAverage,
    Butterworth,
    Bessel,
}

impl From<FilterKind> for Filter {
    fn from(kind: FilterKind) -> Self {
        match kind {
            FilterKind::MovingAverage => Self::MovingAverage(MovingAverage::new()),
            FilterKind::Butterworth => Self::Butterworth(Butterworth::new()),
            FilterKind::Bessel => Self::Bessel(Bessel::new()),
        }
    }
}
