/// Tonnage. All quantities of product are carried as `f64` tonnes.
pub type Tons = f64;

/// Rail distance in kilometres.
pub type Km = f64;

/// Simulated days are the atomic unit of time. Day 1 is the first day.
pub type Day = u32;

/// True when `v` is indistinguishable from zero under `epsilon`.
#[inline]
pub fn is_negligible(v: Tons, epsilon: f64) -> bool {
    v <= epsilon
}

/// Number of wagons needed to carry `tons`, tolerating floating-point noise
/// just above an exact multiple of `capacity`.
#[inline]
pub fn wagons_for(tons: Tons, capacity: Tons, epsilon: f64) -> u32 {
    if tons <= epsilon {
        return 0;
    }
    ((tons / capacity) - epsilon).ceil().max(1.0) as u32
}
