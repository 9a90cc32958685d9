use crate::domain::sizing::WidthClass;

/// Picks the width whose representative girth is closest to `ball_girth`.
///
/// Without EE or EEE candidates the answer is always D. Ties go to the
/// narrower width.
pub fn determine_width(
    ball_girth: f64,
    d_girth: f64,
    ee_girth: Option<f64>,
    eee_girth: Option<f64>,
) -> WidthClass {
    if ee_girth.is_none() && eee_girth.is_none() {
        return WidthClass::D;
    }

    let d_diff = (ball_girth - d_girth).abs();
    let ee_diff = ee_girth.map_or(f64::INFINITY, |girth| (ball_girth - girth).abs());
    let eee_diff = eee_girth.map_or(f64::INFINITY, |girth| (ball_girth - girth).abs());

    if d_diff <= ee_diff && d_diff <= eee_diff {
        WidthClass::D
    } else if ee_diff <= eee_diff {
        WidthClass::Ee
    } else {
        WidthClass::Eee
    }
}
