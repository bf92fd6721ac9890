//! Fixed-width histogram of a sorted sample
//!
use std::fs::File;
use std::io::Write;
use std::path::Path;

use is_sorted::IsSorted;
use tracing::{debug, info};

use crate::SpectrumError;

///
/// Single bin of a [Histogram]
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bin {
    pub index: usize,
    pub count: usize,
}

///
/// Counts of samples in equal-width bins covering `[0, domain_max]`
///
/// Bin `i` covers `(i·w, (i+1)·w]` where `w = domain_max / bin_count`. The
/// first bin also contains `0`. The upper edge of the last bin is exactly
/// `domain_max`.
///
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    domain_max: f64,
    bins: Vec<Bin>,
}

impl Histogram {
    /// Bin a sample that is already sorted in ascending order
    ///
    /// Samples are assigned in a single sweep, moving to the next bin whenever
    /// the current sample lies above the upper edge of the current bin.
    ///
    /// # Errors
    /// - [SpectrumError::InvalidConfig] if the domain is empty or `bin_count` is zero
    /// - [SpectrumError::UnsortedSamples] if `sorted` is not in ascending order
    /// - [SpectrumError::SampleOutOfRange] if any sample is outside `[0, domain_max]`
    ///
    /// ```
    /// # use watt_sampler::Histogram;
    /// let hist = Histogram::build(&[0.05, 0.75, 0.8, 1.6, 7.99], 8.0, 10).unwrap();
    /// assert_eq!(vec![3, 1, 0, 0, 0, 0, 0, 0, 0, 1], hist.counts());
    /// ```
    ///
    pub fn build(sorted: &[f64], domain_max: f64, bin_count: usize) -> Result<Self, SpectrumError> {
        if !(domain_max.is_finite() && domain_max > 0.0) || bin_count == 0 {
            return Err(SpectrumError::InvalidConfig(format!(
                "cannot make {bin_count} bins over [0, {domain_max}]"
            )));
        }
        if !IsSorted::is_sorted(&mut sorted.iter()) {
            return Err(SpectrumError::UnsortedSamples);
        }
        // Sorted, so only the ends need to be checked
        if let Some(&value) = sorted
            .first()
            .filter(|v| !(**v >= 0.0))
            .or_else(|| sorted.last().filter(|v| !(**v <= domain_max)))
        {
            return Err(SpectrumError::SampleOutOfRange { value, domain_max });
        }

        let mut hist = Self {
            domain_max,
            bins: (0..bin_count).map(|index| Bin { index, count: 0 }).collect(),
        };

        let mut bin = 0;
        let mut upper = hist.upper_edge(bin);
        for &x in sorted {
            while x > upper {
                bin += 1;
                upper = hist.upper_edge(bin);
            }
            hist.bins[bin].count += 1;
        }

        debug!(bins = bin_count, total = hist.total(), "Histogram built");
        Ok(hist)
    }

    /// Sort the samples and bin them
    ///
    pub fn from_unsorted(
        mut samples: Vec<f64>,
        domain_max: f64,
        bin_count: usize,
    ) -> Result<Self, SpectrumError> {
        samples.sort_by(f64::total_cmp);
        Self::build(&samples, domain_max, bin_count)
    }

    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    pub fn counts(&self) -> Vec<usize> {
        self.bins.iter().map(|b| b.count).collect()
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn bin_width(&self) -> f64 {
        self.domain_max / self.bins.len() as f64
    }

    pub fn domain_max(&self) -> f64 {
        self.domain_max
    }

    /// Total number of binned samples
    pub fn total(&self) -> usize {
        self.bins.iter().map(|b| b.count).sum()
    }

    /// Upper edge of bin `i`
    fn upper_edge(&self, i: usize) -> f64 {
        if i + 1 >= self.bins.len() {
            self.domain_max
        } else {
            (i + 1) as f64 * self.bin_width()
        }
    }

    /// All `bin_count + 1` bin edges starting from `0`
    pub fn edges(&self) -> Vec<f64> {
        std::iter::once(0.0)
            .chain((0..self.bins.len()).map(|i| self.upper_edge(i)))
            .collect()
    }

    /// Index of the bin `x` belongs to, `None` outside of `[0, domain_max]`
    ///
    pub fn bin_of(&self, x: f64) -> Option<usize> {
        if !(0.0..=self.domain_max).contains(&x) {
            return None;
        }
        (0..self.bins.len()).find(|&i| x <= self.upper_edge(i))
    }

    /// Write the bins as a tab-separated table with a `Bin  Count` header
    ///
    pub fn write_table<W: Write>(&self, writer: W) -> Result<(), SpectrumError> {
        let mut table = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .from_writer(writer);

        table.write_record(["Bin", "Count"])?;
        for bin in &self.bins {
            table.write_record([bin.index.to_string(), bin.count.to_string()])?;
        }
        table.flush()?;
        Ok(())
    }

    /// Write the table to `path`, replacing any existing file
    ///
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SpectrumError> {
        let path = path.as_ref();
        self.write_table(File::create(path)?)?;
        info!(path = %path.display(), "Bin table written");
        Ok(())
    }
}
