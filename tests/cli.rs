use assert_cmd::Command;

mod common;

#[test]
fn runs() {
    let mut cmd = Command::cargo_bin("aufmass").unwrap();
    cmd.assert().success();
}

#[test]
fn outputs_tool_name() {
    let mut cmd = Command::cargo_bin("aufmass").unwrap();
    cmd.arg("-V");
    cmd.assert().success().stdout("aufmass 0.4.0\n");
}

// Import subcommand tests

#[test]
fn import_detects_utm32_csv() {
    let mut cmd = Command::cargo_bin("aufmass").unwrap();
    cmd.arg("import").arg(common::fixture("utm32_punkte.csv"));
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("EPSG:25832"))
        .stdout(predicates::str::contains("full confidence"))
        .stdout(predicates::str::contains("accepted points: 5"));
}

#[test]
fn import_reports_geographic_passthrough_for_gpx() {
    let mut cmd = Command::cargo_bin("aufmass").unwrap();
    cmd.arg("import").arg(common::fixture("leitung.gpx"));
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("EPSG:4326"));
}

#[test]
fn import_json_output_is_structured() {
    let mut cmd = Command::cargo_bin("aufmass").unwrap();
    cmd.args(["import", "--output", "json"])
        .arg(common::fixture("baustelle.geojson"));
    cmd.assert()
        .success()
        .stdout(predicates::str::contains("\"crs\": \"EPSG:4326\""))
        .stdout(predicates::str::contains("\"confidence\": \"full\""));
}

#[test]
fn import_without_coordinates_fails() {
    let mut cmd = Command::cargo_bin("aufmass").unwrap();
    cmd.arg("import").arg(common::fixture("notizen.csv"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("No coordinate records"));
}

#[test]
fn import_rejects_unknown_crs_argument() {
    let mut cmd = Command::cargo_bin("aufmass").unwrap();
    cmd.args(["import", "--crs", "27700"])
        .arg(common::fixture("utm32_punkte.csv"));
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("unknown reference system"));
}

#[test]
fn import_rejects_unsupported_extension() {
    let mut cmd = Command::cargo_bin("aufmass").unwrap();
    cmd.args(["import", "plan.dwg"]);
    cmd.assert()
        .failure()
        .stderr(predicates::str::contains("Unsupported format"));
}
