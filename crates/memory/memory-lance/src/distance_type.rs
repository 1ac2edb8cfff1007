//! Distance metrics for vector similarity search.
//!
//! Maps to lancedb::DistanceType and converts the `_distance` values returned by Lance
//! (lower = closer) into relevance scores (higher = more similar).

/// Distance metrics for vector similarity search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DistanceType {
    /// Cosine distance, `1 - cos_sim`; relevance equals cosine similarity
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    L2,
    /// Dot product distance, `1 - dot`
    Dot,
}

impl DistanceType {
    pub(crate) fn as_lance_metric(&self) -> lancedb::DistanceType {
        match self {
            DistanceType::Cosine => lancedb::DistanceType::Cosine,
            DistanceType::L2 => lancedb::DistanceType::L2,
            DistanceType::Dot => lancedb::DistanceType::Dot,
        }
    }

    /// Converts a Lance distance into a relevance score.
    ///
    /// Cosine and Dot give `1 - distance`, so a cosine relevance matches the volatile store's
    /// cosine similarity. L2 gives `1 / (1 + distance)`, in `(0, 1]`. A non-finite distance
    /// (Lance's cosine against a zero vector is NaN) has relevance 0.
    pub fn relevance(&self, distance: f32) -> f64 {
        let distance = f64::from(distance);
        if !distance.is_finite() {
            return 0.0;
        }
        match self {
            DistanceType::Cosine | DistanceType::Dot => 1.0 - distance,
            DistanceType::L2 => 1.0 / (1.0 + distance.max(0.0)),
        }
    }
}

impl std::str::FromStr for DistanceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "cosine" => Ok(DistanceType::Cosine),
            "l2" | "euclidean" => Ok(DistanceType::L2),
            "dot" => Ok(DistanceType::Dot),
            other => Err(format!("unknown distance type: {other}")),
        }
    }
}
