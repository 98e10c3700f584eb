use std::cell::RefCell;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use tempfile::TempDir;

use super::classify::{is_ignorable, is_xml_file};
use super::document::Document;
use super::extract::{extract_record, extract_records, normalize_name};
use super::texture::{TextureConverter, WebpConverter};
use super::variants::{expand, has_configurations};
use super::walk::{run_ingestion, run_ingestion_with};
use crate::error::IngestError;
use crate::model::{EquipmentRecord, SkipReason, StoredVehicle};
use crate::store::{EquipmentStore, SqliteStore};

#[derive(Default)]
struct RecordingConverter {
    inputs: RefCell<Vec<PathBuf>>,
}

impl TextureConverter for RecordingConverter {
    fn convert(&self, input: &Path) -> Option<String> {
        self.inputs.borrow_mut().push(input.to_path_buf());
        let stem = input.file_stem()?.to_string_lossy().into_owned();
        Some(format!("static/{stem}.webp"))
    }
}

struct NoImages;

impl TextureConverter for NoImages {
    fn convert(&self, _input: &Path) -> Option<String> {
        None
    }
}

#[derive(Default)]
struct FailingStore {
    staged: Vec<EquipmentRecord>,
    rolled_back: usize,
}

impl EquipmentStore for FailingStore {
    fn add(&mut self, record: EquipmentRecord) {
        self.staged.push(record);
    }

    fn commit(&mut self) -> Result<usize> {
        bail!("disk full")
    }

    fn rollback(&mut self) -> usize {
        self.rolled_back = self.staged.len();
        self.staged.clear();
        self.rolled_back
    }

    fn query_all(&self) -> Result<Vec<StoredVehicle>> {
        Ok(Vec::new())
    }

    fn query_by_key(&self, _id: i64) -> Result<Option<StoredVehicle>> {
        Ok(None)
    }

    fn delete(&mut self, _id: i64) -> Result<bool> {
        Ok(false)
    }
}

fn doc(raw: &str) -> Document {
    Document::parse(Path::new("/game/vehicles/fendt/vario700/vario700.xml"), raw)
        .expect("fixture xml should parse")
}

fn store_data_xml(specs: &str, extra: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8" standalone="no" ?>
<vehicle type="tractor">
    <annotation>Copyright (C) GIANTS Software GmbH</annotation>
    <storeData>
        <name>Vario 700</name>
        <brand>FENDT</brand>
        <category>tractorsM</category>
        <price>10000</price>
        <image>$data/vehicles/fendt/vario700/store_vario700.png</image>
        <specs>{specs}</specs>
    </storeData>
    {extra}
</vehicle>"#
    )
}

fn write_dds(path: &Path) {
    let rgba = image::RgbaImage::from_pixel(4, 4, image::Rgba([180, 40, 20, 255]));
    let dds = image_dds::dds_from_image(
        &rgba,
        image_dds::ImageFormat::Rgba8Unorm,
        image_dds::Quality::Fast,
        image_dds::Mipmaps::Disabled,
    )
    .expect("dds fixture should encode");
    let mut file = File::create(path).expect("dds fixture should be writable");
    dds.write(&mut file).expect("dds fixture should serialize");
}

fn write_file(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().expect("fixture path should have a parent"))
        .expect("fixture directory should be created");
    fs::write(path, contents).expect("fixture should be written");
}

#[test]
fn ignored_directories_match_whole_path_segments() {
    assert!(is_ignorable(Path::new("/data/vehicles/sounds"), "tractor01.xml"));
    assert!(is_ignorable(Path::new("/data/cars/lizard"), "pickup.xml"));
    assert!(is_ignorable(Path::new("/data/vehicles/fendt/sounds/engine"), "motor.xml"));
    assert!(!is_ignorable(Path::new("/data/vehicles/soundsystem"), "tractor01.xml"));
    assert!(!is_ignorable(Path::new("/data/vehicles/scars"), "tractor01.xml"));
}

#[test]
fn ignored_keywords_match_case_sensitive_substrings() {
    let directory = Path::new("/data/vehicles/fendt/vario700");
    assert!(is_ignorable(directory, "vario700Bundle.xml"));
    assert!(is_ignorable(directory, "vario700_store.xml"));
    assert!(is_ignorable(directory, "workLight.xml"));
    assert!(!is_ignorable(directory, "tractor01.xml"));
    assert!(!is_ignorable(directory, "bundleless.xml"));
    assert!(!is_ignorable(directory, "lightweight.xml"));
}

#[test]
fn only_xml_extensions_are_considered() {
    assert!(is_xml_file(Path::new("vario700.xml")));
    assert!(!is_xml_file(Path::new("store_vario700.dds")));
    assert!(!is_xml_file(Path::new("README")));
}

#[test]
fn normalize_name_maps_non_breaking_hyphen_only_where_known() {
    assert_eq!(normalize_name("Arion\u{2011}660"), "Arion-660");
    assert_eq!(normalize_name("Väderstad Rapid A 600J"), "Väderstad Rapid A 600J");
}

#[test]
fn extract_reads_store_data_fields() {
    let textures = RecordingConverter::default();
    let document = doc(&store_data_xml("<power>120</power>", ""));

    let records = extract_records(&document, &textures).expect("store data should extract");

    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.name, "Vario 700");
    assert_eq!(record.brand, "FENDT");
    assert_eq!(record.category, "tractorsM");
    assert_eq!(record.price, 10_000);
    assert_eq!(record.power, Some(120));
    assert_eq!(record.image_ref.as_deref(), Some("static/store_vario700.webp"));
    assert_eq!(
        textures.inputs.borrow().as_slice(),
        [PathBuf::from("/game/vehicles/fendt/vario700/store_vario700.dds")]
    );
}

#[test]
fn power_falls_back_to_needed_power_then_absent() {
    let implement = doc(&store_data_xml("<neededPower>80</neededPower>", ""));
    let passive = doc(&store_data_xml("<workingWidth>3</workingWidth>", ""));
    let both = doc(&store_data_xml("<power>120</power><neededPower>80</neededPower>", ""));

    assert_eq!(extract_record(&implement).expect("extract").power, Some(80));
    assert_eq!(extract_record(&passive).expect("extract").power, None);
    assert_eq!(extract_record(&both).expect("extract").power, Some(120));
}

#[test]
fn missing_price_defaults_to_zero_and_missing_image_is_none() {
    let document = doc(
        r#"<vehicle><storeData>
            <name>Pallet Fork</name>
            <brand>LIZARD</brand>
            <category>frontLoaderTools</category>
        </storeData></vehicle>"#,
    );
    let textures = RecordingConverter::default();

    let records = extract_records(&document, &textures).expect("store data should extract");
    let record = &records[0];
    assert_eq!(record.price, 0);
    assert_eq!(record.power, None);
    assert_eq!(record.image_ref, None);
    assert!(textures.inputs.borrow().is_empty());
}

#[test]
fn extracted_name_is_normalized_and_localized_names_use_english() {
    let hyphenated = doc(
        r#"<vehicle><storeData>
            <name>6R&#x2011;250</name><brand>JOHNDEERE</brand><category>tractorsL</category>
        </storeData></vehicle>"#,
    );
    let localized = doc(
        r#"<vehicle><storeData>
            <name><en>Bale Trailer</en><de>Ballenwagen</de></name>
            <brand>KRONE</brand><category>trailers</category>
        </storeData></vehicle>"#,
    );

    assert_eq!(extract_record(&hyphenated).expect("extract").name, "6R-250");
    assert_eq!(extract_record(&localized).expect("extract").name, "Bale Trailer");
}

#[test]
fn name_whitespace_is_kept_verbatim() {
    let document = doc(
        r#"<vehicle><storeData>
            <name>  Rapid  A 600J </name><brand>VAEDERSTAD</brand><category>seeders</category>
        </storeData></vehicle>"#,
    );

    assert_eq!(extract_record(&document).expect("extract").name, "  Rapid  A 600J ");
}

#[test]
fn missing_store_data_is_reported_without_a_record() {
    let document = doc(r#"<vehicle><base><typeDesc>tractor</typeDesc></base></vehicle>"#);

    let err = extract_record(&document).expect_err("extract should fail");
    assert!(matches!(err, IngestError::MissingStoreData { .. }));
}

#[test]
fn missing_brand_and_bad_numbers_fail_the_file() {
    let no_brand = doc(
        r#"<vehicle><storeData><name>X</name><category>misc</category></storeData></vehicle>"#,
    );
    let bad_price = doc(
        r#"<vehicle><storeData><name>X</name><brand>Y</brand><category>misc</category><price>lots</price></storeData></vehicle>"#,
    );

    assert!(matches!(
        extract_record(&no_brand),
        Err(IngestError::MissingField { element: "brand", .. })
    ));
    assert!(matches!(
        extract_record(&bad_price),
        Err(IngestError::InvalidNumber { .. })
    ));
}

#[test]
fn document_without_configurations_yields_the_base_record_only() {
    let document = doc(&store_data_xml("<power>120</power>", ""));
    let base = extract_record(&document).expect("extract");

    assert!(!has_configurations(&document));
    let records = expand(&document, base.clone()).expect("expand");
    assert_eq!(records, vec![base]);
}

#[test]
fn configurations_replace_the_base_record() {
    let configurations = r#"
    <motorized>
        <motorConfigurations>
            <motorConfiguration name="714 Vario" hp="145" price="0" />
            <motorConfiguration name="720 Vario" hp="205" price="500" />
            <motorConfiguration hp="240" price="12000" />
            <motorConfiguration name="Vario&#x2011;Max" />
        </motorConfigurations>
    </motorized>"#;
    let document = doc(&store_data_xml("<power>120</power>", configurations));
    let base = extract_record(&document).expect("extract");

    assert!(has_configurations(&document));
    let records = expand(&document, base.clone()).expect("expand");

    assert_eq!(records.len(), 4);
    assert!(!records.contains(&base));
    assert_eq!(records[0].name, "714 Vario");
    assert_eq!(records[0].price, 10_000);
    assert_eq!(records[1].price, 10_500);
    assert_eq!(records[1].power, Some(205));
    assert_eq!(records[2].name, "Vario 700");
    assert_eq!(records[2].price, 22_000);
    assert_eq!(records[3].name, "Vario-Max");
    assert_eq!(records[3].power, Some(120));
    assert!(records.iter().all(|record| record.brand == "FENDT"));
}

#[test]
fn overflowing_configuration_price_fails_the_file() {
    let configurations = r#"
    <motorized>
        <motorConfigurations>
            <motorConfiguration name="714 Vario" price="9223372036854775807" />
        </motorConfigurations>
    </motorized>"#;
    let document = doc(&store_data_xml("<power>120</power>", configurations));
    let base = extract_record(&document).expect("extract");

    assert!(matches!(
        expand(&document, base),
        Err(IngestError::InvalidNumber { .. })
    ));
}

#[test]
fn failed_expansion_converts_no_texture() {
    let configurations = r#"
    <motorized>
        <motorConfigurations>
            <motorConfiguration name="714 Vario" hp="lots" />
        </motorConfigurations>
    </motorized>"#;
    let document = doc(&store_data_xml("<power>120</power>", configurations));
    let textures = RecordingConverter::default();

    assert!(matches!(
        extract_records(&document, &textures),
        Err(IngestError::InvalidNumber { .. })
    ));
    assert!(textures.inputs.borrow().is_empty());
}

#[test]
fn variants_share_the_converted_image() {
    let configurations = r#"
    <motorized>
        <motorConfigurations>
            <motorConfiguration name="714 Vario" />
            <motorConfiguration name="720 Vario" price="500" />
        </motorConfigurations>
    </motorized>"#;
    let document = doc(&store_data_xml("<power>120</power>", configurations));
    let textures = RecordingConverter::default();

    let records = extract_records(&document, &textures).expect("extract should succeed");

    assert_eq!(records.len(), 2);
    assert_eq!(textures.inputs.borrow().len(), 1);
    assert!(
        records
            .iter()
            .all(|record| record.image_ref.as_deref() == Some("static/store_vario700.webp"))
    );
}

#[test]
fn empty_configuration_container_keeps_the_base_record() {
    let document = doc(&store_data_xml(
        "<power>120</power>",
        "<motorized><motorConfigurations /></motorized>",
    ));
    let base = extract_record(&document).expect("extract");

    assert!(!has_configurations(&document));
    assert_eq!(expand(&document, base.clone()).expect("expand"), vec![base]);
}

#[test]
fn texture_converts_to_webp_named_after_input() {
    let temp = TempDir::new().expect("temp dir should be created");
    let input = temp.path().join("store_vario700.dds");
    write_dds(&input);
    let output_dir = temp.path().join("static");

    let converter = WebpConverter::new(&output_dir);
    let output = converter.try_convert(&input).expect("conversion should succeed");

    assert_eq!(output, output_dir.join("store_vario700.webp"));
    let written = image::open(&output).expect("webp output should decode");
    assert_eq!(written.width(), 4);
    assert_eq!(written.height(), 4);
}

#[test]
fn missing_or_corrupt_textures_yield_no_image() {
    let temp = TempDir::new().expect("temp dir should be created");
    let corrupt = temp.path().join("store_broken.dds");
    fs::write(&corrupt, b"not a dds surface").expect("corrupt fixture should be written");

    let converter = WebpConverter::new(temp.path().join("static"));

    assert_eq!(converter.convert(&temp.path().join("store_missing.dds")), None);
    assert_eq!(converter.convert(&corrupt), None);
    assert!(!temp.path().join("static").join("store_broken.webp").exists());
}

fn build_game_tree(root: &Path) {
    let configurations = r#"
    <motorized>
        <motorConfigurations>
            <motorConfiguration name="714 Vario" hp="145" price="0" />
            <motorConfiguration name="720 Vario" hp="205" price="500" />
        </motorConfigurations>
    </motorized>"#;

    write_file(
        &root.join("fendt/vario700/vario700.xml"),
        &store_data_xml("<power>120</power>", configurations),
    );
    write_dds(&root.join("fendt/vario700/store_vario700.dds"));
    write_file(
        &root.join("fendt/vario700/vario700Bundle.xml"),
        "<bundle><item xmlFilename=\"vario700.xml\"/></bundle>",
    );
    write_file(
        &root.join("kuhn/plough/plough.xml"),
        r#"<vehicle><storeData>
            <name>Multi&#x2011;Master 183</name>
            <brand>KUHN</brand>
            <category>ploughs</category>
            <price>24000</price>
            <image>$data/vehicles/kuhn/plough/store_plough.png</image>
            <specs><neededPower>80</neededPower></specs>
        </storeData></vehicle>"#,
    );
    write_file(&root.join("sounds/engine.xml"), "<sounds />");
    write_file(&root.join("cars/pickup/pickup.xml"), "<vehicle />");
    write_file(&root.join("misc/readme.txt"), "not xml");
    write_file(&root.join("misc/empty.xml"), "<vehicle><base /></vehicle>");
    write_file(&root.join("misc/broken.xml"), "<vehicle><storeData>");
}

#[test]
fn ingestion_counts_files_and_commits_expanded_records() {
    let temp = TempDir::new().expect("temp dir should be created");
    let root = temp.path().join("vehicles");
    let staging = temp.path().join("static");
    build_game_tree(&root);

    let mut store = SqliteStore::open_in_memory().expect("in-memory store should open");
    let run = run_ingestion(&root, &staging, &mut store).expect("ingest should succeed");

    assert_eq!(run.skipped, None);
    assert_eq!(run.valid_count, 4);
    assert_eq!(run.invalid_count, 3);
    assert_eq!(run.records_committed, 3);

    let vehicles = store.query_all().expect("query should run");
    let names: Vec<&str> = vehicles.iter().map(|vehicle| vehicle.model.as_str()).collect();
    assert_eq!(names, vec!["714 Vario", "720 Vario", "Multi-Master 183"]);

    let webp = staging.join("store_vario700.webp");
    assert!(webp.exists());
    assert_eq!(vehicles[1].price, 10_500);
    assert_eq!(vehicles[1].img_url.as_deref(), Some(webp.display().to_string().as_str()));

    let plough = &vehicles[2];
    assert_eq!(plough.power, Some(80));
    assert_eq!(plough.img_url, None);
}

#[test]
fn second_run_with_populated_staging_directory_inserts_nothing() {
    let temp = TempDir::new().expect("temp dir should be created");
    let root = temp.path().join("vehicles");
    let staging = temp.path().join("static");
    build_game_tree(&root);

    let mut store = SqliteStore::open_in_memory().expect("in-memory store should open");
    run_ingestion(&root, &staging, &mut store).expect("first ingest should succeed");
    let before = store.query_all().expect("query should run").len();

    let second = run_ingestion(&root, &staging, &mut store).expect("second ingest should succeed");

    assert_eq!(second.skipped, Some(SkipReason::AlreadyIngested));
    assert_eq!(second.valid_count, 0);
    assert_eq!(second.records_committed, 0);
    assert_eq!(store.query_all().expect("query should run").len(), before);
}

#[test]
fn absent_game_directory_is_a_no_op() {
    let temp = TempDir::new().expect("temp dir should be created");
    let mut store = SqliteStore::open_in_memory().expect("in-memory store should open");

    let run = run_ingestion(
        &temp.path().join("not-installed"),
        &temp.path().join("static"),
        &mut store,
    )
    .expect("absent source should not fail");

    assert_eq!(run.skipped, Some(SkipReason::SourceRootAbsent));
    assert!(store.query_all().expect("query should run").is_empty());
    assert!(!temp.path().join("static").exists());
}

#[test]
fn overflowing_file_is_skipped_and_the_rest_commit() {
    let temp = TempDir::new().expect("temp dir should be created");
    let root = temp.path().join("vehicles");
    write_file(
        &root.join("a/a.xml"),
        &store_data_xml(
            "<power>120</power>",
            r#"<motorized><motorConfigurations>
                <motorConfiguration name="Overpriced" price="9223372036854775807" />
            </motorConfigurations></motorized>"#,
        ),
    );
    write_file(
        &root.join("b/b.xml"),
        r#"<vehicle><storeData>
            <name>Pallet Fork</name><brand>LIZARD</brand><category>frontLoaderTools</category>
        </storeData></vehicle>"#,
    );

    let mut store = SqliteStore::open_in_memory().expect("in-memory store should open");
    let run = run_ingestion_with(&root, &temp.path().join("static"), &NoImages, &mut store)
        .expect("ingest should survive the bad file");

    assert_eq!(run.valid_count, 2);
    assert_eq!(run.records_committed, 1);
    let vehicles = store.query_all().expect("query should run");
    assert_eq!(vehicles.len(), 1);
    assert_eq!(vehicles[0].model, "Pallet Fork");
}

#[test]
fn commit_failure_is_fatal_and_discards_staged_records() {
    let temp = TempDir::new().expect("temp dir should be created");
    let root = temp.path().join("vehicles");
    build_game_tree(&root);

    let mut store = FailingStore::default();
    let result = run_ingestion_with(&root, &temp.path().join("static"), &NoImages, &mut store);

    assert!(result.is_err());
    assert_eq!(store.rolled_back, 3);
    assert!(store.staged.is_empty());
}
