use ndarray::Array2;

/// A uniform-binning 1D histogram used for the per-event monitoring spectra.
#[derive(Debug, Clone)]
pub struct Hist1D {
    name: String,
    lo: f64,
    hi: f64,
    counts: Vec<f64>,
}

impl Hist1D {
    pub fn new(name: impl Into<String>, n_bins: usize, lo: f64, hi: f64) -> Self {
        Self {
            name: name.into(),
            lo,
            hi,
            counts: vec![0.0; n_bins],
        }
    }

    /// Count a value; values outside the axis range are dropped
    pub fn fill(&mut self, value: f64) {
        if value < self.lo || value >= self.hi {
            return;
        }
        let bin = ((value - self.lo) / (self.hi - self.lo) * self.counts.len() as f64) as usize;
        let bin = bin.min(self.counts.len() - 1);
        self.counts[bin] += 1.0;
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn counts(&self) -> &[f64] {
        &self.counts
    }

    pub fn range(&self) -> (f64, f64) {
        (self.lo, self.hi)
    }
}

/// A uniform-binning 2D histogram backed by an ndarray matrix.
///
/// The matrix is stored rows-first ([y][x]) so that iterating the underlying
/// data walks the image with the y loop outermost, which is the row order of
/// the CSV output.
#[derive(Debug, Clone)]
pub struct Hist2D {
    name: String,
    nx: usize,
    ny: usize,
    x_lo: f64,
    x_hi: f64,
    y_lo: f64,
    y_hi: f64,
    data: Array2<f64>,
}

impl Hist2D {
    pub fn new(
        name: impl Into<String>,
        nx: usize,
        x_range: (f64, f64),
        ny: usize,
        y_range: (f64, f64),
    ) -> Self {
        Self {
            name: name.into(),
            nx,
            ny,
            x_lo: x_range.0,
            x_hi: x_range.1,
            y_lo: y_range.0,
            y_hi: y_range.1,
            data: Array2::zeros([ny, nx]),
        }
    }

    /// Bin index along x; out-of-range values land in the edge bins
    pub fn bin_x(&self, x: f64) -> usize {
        Self::bin_index(x, self.x_lo, self.x_hi, self.nx)
    }

    /// Bin index along y; out-of-range values land in the edge bins
    pub fn bin_y(&self, y: f64) -> usize {
        Self::bin_index(y, self.y_lo, self.y_hi, self.ny)
    }

    fn bin_index(value: f64, lo: f64, hi: f64, n: usize) -> usize {
        let frac = (value - lo) / (hi - lo);
        let bin = (frac * n as f64).floor();
        if bin < 0.0 {
            0
        } else {
            (bin as usize).min(n - 1)
        }
    }

    pub fn set(&mut self, ix: usize, iy: usize, value: f64) {
        self.data[[iy, ix]] = value;
    }

    pub fn add(&mut self, ix: usize, iy: usize, value: f64) {
        self.data[[iy, ix]] += value;
    }

    pub fn get(&self, ix: usize, iy: usize) -> f64 {
        self.data[[iy, ix]]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn nx(&self) -> usize {
        self.nx
    }

    pub fn ny(&self) -> usize {
        self.ny
    }

    pub fn x_range(&self) -> (f64, f64) {
        (self.x_lo, self.x_hi)
    }

    pub fn y_range(&self) -> (f64, f64) {
        (self.y_lo, self.y_hi)
    }

    pub fn data(&self) -> &Array2<f64> {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hist1d_fill() {
        let mut hist = Hist1D::new("hit_times", 2000, 0.0, 2000.0);
        hist.fill(0.0);
        hist.fill(999.5);
        hist.fill(999.9);
        hist.fill(2000.0); // overflow, dropped
        hist.fill(-1.0); // underflow, dropped
        assert_eq!(hist.counts()[0], 1.0);
        assert_eq!(hist.counts()[999], 2.0);
        assert_eq!(hist.counts().iter().sum::<f64>(), 3.0);
    }

    #[test]
    fn test_hist2d_binning() {
        let hist = Hist2D::new("image", 151, (0.0, 1.0), 101, (0.0, 1.0));
        assert_eq!(hist.bin_x(0.0), 0);
        assert_eq!(hist.bin_x(0.5), 75);
        assert_eq!(hist.bin_x(0.9999), 150);
        // out of range clamps to the edges
        assert_eq!(hist.bin_x(-0.5), 0);
        assert_eq!(hist.bin_x(1.5), 150);
        assert_eq!(hist.bin_y(0.5), 50);
    }

    #[test]
    fn test_hist2d_set_add_get() {
        let mut hist = Hist2D::new("image", 10, (0.0, 1.0), 5, (0.0, 1.0));
        hist.set(3, 2, 1.5);
        hist.add(3, 2, 0.5);
        assert_eq!(hist.get(3, 2), 2.0);
        assert_eq!(hist.get(0, 0), 0.0);
    }

    #[test]
    fn test_hist2d_row_major_order() {
        let mut hist = Hist2D::new("image", 3, (0.0, 1.0), 2, (0.0, 1.0));
        // fill with a value encoding (ix, iy)
        for iy in 0..2 {
            for ix in 0..3 {
                hist.set(ix, iy, (iy * 3 + ix) as f64);
            }
        }
        // flat iteration must walk y-outer, x-inner
        let flat: Vec<f64> = hist.data().iter().copied().collect();
        assert_eq!(flat, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
