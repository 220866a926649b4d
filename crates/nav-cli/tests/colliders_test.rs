use nav_cli::{load_colliders, parse_colliders};
use nav_core::{GeodeticPosition, MapError, Obstacle};

const SAMPLE: &str = "\
lat0 37.792480, lon0 -122.397450
posX,posY,posZ,halfSizeX,halfSizeY,halfSizeZ
-310.2389,-439.2315,85.5,5,5,85.5
-300.2389,-439.2315,85.5,5,5,85.5

-290.2389,-439.2315,85.5,5,5,85.5
";

#[test]
fn parses_home_and_rows() {
    let map = parse_colliders(SAMPLE).unwrap();
    assert_eq!(map.home(), GeodeticPosition::new(-122.397450, 37.792480, 0.0));
    assert_eq!(map.obstacles().len(), 3);
    assert_eq!(
        map.obstacles()[0],
        Obstacle::new(-310.2389, -439.2315, 85.5, 5.0, 5.0, 85.5)
    );
}

#[test]
fn column_header_is_optional() {
    let text = "lat0 1.0, lon0 2.0\n0,0,1,1,1,1\n";
    let map = parse_colliders(text).unwrap();
    assert_eq!(map.obstacles().len(), 1);
}

#[test]
fn short_row_names_its_line() {
    let text = "\
lat0 1.0, lon0 2.0
posX,posY,posZ,halfSizeX,halfSizeY,halfSizeZ
0,0,1,1,1,1
4,5,6
";
    let err = parse_colliders(text).unwrap_err();
    assert!(err.to_string().contains("line 4"), "{err}");
}

#[test]
fn garbage_row_names_its_line() {
    let text = "lat0 1.0, lon0 2.0\nposX,posY\n0,0,1,1,1,1\n0,zero,1,1,1,1\n";
    let err = parse_colliders(text).unwrap_err();
    assert!(err.to_string().contains("line 4"), "{err}");
}

#[test]
fn header_only_file_is_an_empty_map() {
    let text = "lat0 1.0, lon0 2.0\nposX,posY,posZ,halfSizeX,halfSizeY,halfSizeZ\n";
    let err = parse_colliders(text).unwrap_err();
    assert_eq!(err.downcast_ref::<MapError>(), Some(&MapError::Empty));
}

#[test]
fn missing_home_is_rejected() {
    assert!(parse_colliders("").is_err());
    assert!(parse_colliders("posX,posY,posZ,halfSizeX,halfSizeY,halfSizeZ\n").is_err());
}

#[test]
fn load_reports_missing_file() {
    let err = load_colliders("/definitely/not/here/colliders.csv").unwrap_err();
    assert!(err.to_string().contains("colliders.csv"));
}

#[test]
fn load_reads_file_from_disk() {
    let path = std::env::temp_dir().join(format!("nav-cli-colliders-{}.csv", std::process::id()));
    std::fs::write(&path, SAMPLE).unwrap();
    let map = load_colliders(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(map.obstacles().len(), 3);
}
