//! Concatenation of hazards that share a centroid set.

use tracing::{debug, info};

use crate::error::{HazardError, Result};
use crate::hazard::Hazard;
use crate::sparse;

/// Append `parts` in order into one hazard.
///
/// Each part's event ids are shifted by the largest id collected so far, so
/// ids stay unique across parts. All parts must share hazard type, units
/// and centroids.
pub fn concat_hazards(parts: Vec<Hazard>) -> Result<Hazard> {
    let mut iter = parts.into_iter();
    let mut merged = iter
        .next()
        .ok_or_else(|| HazardError::EmptyInput("no hazards to concatenate".into()))?;
    merged.check()?;

    let mut fractions = vec![merged.fraction.clone()];
    let mut intensities = vec![merged.intensity.clone()];

    for (i, part) in iter.enumerate() {
        part.check()?;
        if part.haz_type != merged.haz_type || part.units != merged.units {
            return Err(HazardError::incompatible(format!(
                "part {} is {} [{}], expected {} [{}]",
                i + 1,
                part.haz_type,
                part.units,
                merged.haz_type,
                merged.units
            )));
        }
        if part.centroids != merged.centroids {
            return Err(HazardError::incompatible(format!(
                "part {} has different centroids ({} vs {})",
                i + 1,
                part.n_centroids(),
                merged.n_centroids()
            )));
        }

        let offset = merged.max_event_id();
        debug!(part = i + 1, events = part.n_events(), offset, "Appending hazard");

        if merged.date.is_empty() != part.date.is_empty() {
            return Err(HazardError::incompatible(format!(
                "part {} disagrees with the first part on whether events are dated",
                i + 1
            )));
        }

        merged.event_id.extend(part.event_id.iter().map(|id| id + offset));
        merged.event_name.extend(part.event_name);
        merged.date.extend(part.date);
        merged.orig.extend(part.orig);
        merged.frequency.extend(part.frequency);
        intensities.push(part.intensity);
        fractions.push(part.fraction);
    }

    merged.intensity = sparse::vstack(&intensities.iter().collect::<Vec<_>>())?;
    merged.fraction = if fractions.iter().all(sparse::is_blank) {
        sparse::zeros(merged.intensity.nrows(), merged.intensity.ncols())
    } else {
        let ncols = merged.intensity.ncols();
        let shaped: Vec<_> = fractions
            .into_iter()
            .zip(&intensities)
            .map(|(f, i)| if sparse::is_blank(&f) { sparse::zeros(i.nrows(), ncols) } else { f })
            .collect();
        sparse::vstack(&shaped.iter().collect::<Vec<_>>())?
    };
    merged.check()?;

    info!(
        events = merged.n_events(),
        centroids = merged.n_centroids(),
        "Concatenated hazards"
    );
    Ok(merged)
}
