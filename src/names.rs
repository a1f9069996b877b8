//! Object name tables, ported verbatim from the original tool's data.
//!
//! Only the objects with recognizable, named targets get a string; anything
//! else falls back to a numbered placeholder.

/// Names for the base 'Chocks Away' game.
const BASE_NAMES: &[(i32, &str)] = &[
    (0, "gun"),
    (1, "store"),
    (2, "tank"),
    (3, "headquarters"),
    (4, "tower"),
    (5, "boat"),
    (18, "tiger"),
    (19, "twin"),
    (22, "gotha"),
    (23, "s_tiger"),
    (24, "s_twin"),
    (25, "s_gotha"),
    (26, "s_eindecker"),
    (27, "s_scout"),
    (28, "s_triplane"),
    (29, "eindecker"),
    (30, "triplane"),
    (31, "scout"),
];

/// Additional names introduced by the 'Extra Missions' expansion.
const EXTRA_NAMES: &[(i32, &str)] = &[
    (46, "bridge"),
    (52, "carrier"),
    (54, "yacht"),
    (68, "factory"),
    (72, "airship"),
    (73, "balloon"),
    (78, "terminal"),
    (79, "tanker"),
    (81, "gunboat"),
    (85, "train"),
    (77, "biplane"),
    (75, "triengine"),
    (74, "cargo"),
    (87, "station"),
    (102, "s_biplane"),
    (103, "s_triengine"),
    (104, "s_cargo"),
    (107, "ground_jet"),
    (108, "jet"),
];

/// Returns the object name for the base game, falling back to `chocks_<n>`.
pub fn get_obj_name(index: i32) -> String {
    BASE_NAMES
        .iter()
        .find(|(num, _)| *num == index)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("chocks_{}", index))
}

/// Returns the object name including Extra Missions targets, falling back to
/// [`get_obj_name`].
pub fn get_obj_name_extra(index: i32) -> String {
    EXTRA_NAMES
        .iter()
        .find(|(num, _)| *num == index)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| get_obj_name(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_base_names() {
        assert_eq!(get_obj_name(0), "gun");
        assert_eq!(get_obj_name(2), "tank");
        assert_eq!(get_obj_name(31), "scout");
    }

    #[test]
    fn test_base_fallback() {
        assert_eq!(get_obj_name(6), "chocks_6");
        assert_eq!(get_obj_name(999), "chocks_999");
    }

    #[test]
    fn test_extra_names() {
        assert_eq!(get_obj_name_extra(46), "bridge");
        assert_eq!(get_obj_name_extra(108), "jet");
    }

    #[test]
    fn test_extra_falls_back_to_base() {
        assert_eq!(get_obj_name_extra(2), "tank");
        assert_eq!(get_obj_name_extra(999), "chocks_999");
    }
}
