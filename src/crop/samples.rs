use ndarray::{Array, ArrayD, Dimension};

// ---------------------------------------------------------------------------
// SampleKind – element type with explicit promotion
// ---------------------------------------------------------------------------

/// Element type of a sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    Int,
    Float,
}

impl SampleKind {
    /// Smallest kind able to represent values of both `self` and `other`.
    ///
    /// Integers only stay integers when combined with integers; any floating
    /// participant (NaN sentinels included) promotes to `Float`.
    pub fn promote(self, other: SampleKind) -> SampleKind {
        match (self, other) {
            (SampleKind::Int, SampleKind::Int) => SampleKind::Int,
            _ => SampleKind::Float,
        }
    }
}

// ---------------------------------------------------------------------------
// FillValue – out-of-range sentinel
// ---------------------------------------------------------------------------

/// Value written wherever a window reads outside its series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillValue {
    Int(i64),
    Float(f64),
}

impl FillValue {
    pub const NAN: FillValue = FillValue::Float(f64::NAN);

    pub fn kind(&self) -> SampleKind {
        match self {
            FillValue::Int(_) => SampleKind::Int,
            FillValue::Float(_) => SampleKind::Float,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match *self {
            FillValue::Int(v) => v as f64,
            FillValue::Float(v) => v,
        }
    }
}

impl Default for FillValue {
    fn default() -> Self {
        FillValue::NAN
    }
}

impl From<f64> for FillValue {
    fn from(v: f64) -> Self {
        FillValue::Float(v)
    }
}

impl From<i64> for FillValue {
    fn from(v: i64) -> Self {
        FillValue::Int(v)
    }
}

// ---------------------------------------------------------------------------
// Samples – dimension-agnostic numeric buffer, first axis is time
// ---------------------------------------------------------------------------

/// A numeric sample buffer of any dimensionality whose first axis is time.
#[derive(Debug, Clone, PartialEq)]
pub enum Samples {
    Int(ArrayD<i64>),
    Float(ArrayD<f64>),
}

impl Samples {
    pub fn kind(&self) -> SampleKind {
        match self {
            Samples::Int(_) => SampleKind::Int,
            Samples::Float(_) => SampleKind::Float,
        }
    }

    pub fn shape(&self) -> &[usize] {
        match self {
            Samples::Int(a) => a.shape(),
            Samples::Float(a) => a.shape(),
        }
    }

    pub fn ndim(&self) -> usize {
        self.shape().len()
    }

    /// Length along the time axis.
    pub fn len(&self) -> usize {
        self.shape().first().copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to `kind`, widening integers to floats when needed.
    ///
    /// Narrowing floats to integers is never performed: asking for `Int` on a
    /// float buffer returns it unchanged.
    pub fn promoted(self, kind: SampleKind) -> Samples {
        match (self, kind) {
            (Samples::Int(a), SampleKind::Float) => Samples::Float(a.mapv(|x| x as f64)),
            (other, _) => other,
        }
    }

    pub fn as_float(&self) -> Option<&ArrayD<f64>> {
        match self {
            Samples::Float(a) => Some(a),
            Samples::Int(_) => None,
        }
    }

    pub fn as_int(&self) -> Option<&ArrayD<i64>> {
        match self {
            Samples::Int(a) => Some(a),
            Samples::Float(_) => None,
        }
    }

    /// Floating-point copy of the buffer.
    pub fn to_float(&self) -> ArrayD<f64> {
        match self {
            Samples::Int(a) => a.mapv(|x| x as f64),
            Samples::Float(a) => a.clone(),
        }
    }
}

impl<D: Dimension> From<Array<f64, D>> for Samples {
    fn from(a: Array<f64, D>) -> Self {
        Samples::Float(a.into_dyn())
    }
}

impl<D: Dimension> From<Array<i64, D>> for Samples {
    fn from(a: Array<i64, D>) -> Self {
        Samples::Int(a.into_dyn())
    }
}

impl From<Vec<f64>> for Samples {
    fn from(v: Vec<f64>) -> Self {
        Samples::from(ndarray::Array1::from(v))
    }
}

impl From<Vec<i64>> for Samples {
    fn from(v: Vec<i64>) -> Self {
        Samples::from(ndarray::Array1::from(v))
    }
}
