use super::*;

/// Fee rate in satoshis per kilobyte of serialized transaction size, the
/// unit the node's `FEE_PER_KB` setting uses.
#[derive(Debug, PartialEq, Clone, Copy)]
pub(crate) struct FeeRate(u64);

pub(crate) const DEFAULT_FEE_PER_KB: u64 = 100_000_000;

impl Default for FeeRate {
  fn default() -> Self {
    Self(DEFAULT_FEE_PER_KB)
  }
}

impl FromStr for FeeRate {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::try_from(u64::from_str(s)?)
  }
}

impl TryFrom<u64> for FeeRate {
  type Error = Error;

  fn try_from(rate: u64) -> Result<Self, Self::Error> {
    if rate == 0 {
      bail!("invalid fee rate: {rate}")
    }
    Ok(Self(rate))
  }
}

impl FeeRate {
  pub(crate) fn fee(self, size: usize) -> Amount {
    let size = u64::try_from(size).unwrap();
    Amount::from_sat((size * self.0).div_ceil(1000))
  }
}
