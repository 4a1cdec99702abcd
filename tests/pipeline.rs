//! Integration tests for the text, upload and image paths.
//!
//! Nothing here needs pdfium or tesseract: plain-text files are read
//! directly and images go through an in-process fake OCR engine.

use image::{DynamicImage, Rgb, RgbImage};
use mcq_extract::geometry::BoundingBox;
use mcq_extract::{
    extract_text_from_image, parse_questions_from_file, parse_questions_from_text, McqError,
    MemoryUpload, OcrEngine, OcrWord, ParseConfig, TextEncoding, Uploadable,
};
use std::io::Write;
use std::path::Path;
use std::sync::{Arc, Mutex};

// ── Helpers ──────────────────────────────────────────────────────────────────

fn text_file(contents: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents).unwrap();
    file
}

/// Hands back a fixed word list and remembers the DPI it was asked for.
struct ScriptedOcr {
    words: Vec<OcrWord>,
    seen_dpi: Mutex<Vec<Option<u32>>>,
}

impl ScriptedOcr {
    fn new(words: Vec<OcrWord>) -> Arc<Self> {
        Arc::new(Self {
            words,
            seen_dpi: Mutex::new(Vec::new()),
        })
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(
        &self,
        _image: &DynamicImage,
        _lang: &str,
        dpi: Option<u32>,
    ) -> Result<Vec<OcrWord>, McqError> {
        self.seen_dpi.lock().unwrap().push(dpi);
        Ok(self.words.clone())
    }
}

fn word(text: &str, left: i32, top: i32, width: i32, line: u32) -> OcrWord {
    OcrWord {
        text: text.into(),
        bbox: BoundingBox::from_ltwh(left, top, width, 20),
        block: 1,
        paragraph: 1,
        line,
    }
}

/// Two questions on a white page. Only the numeral of question 1 is red.
fn exam_words() -> Vec<OcrWord> {
    vec![
        word("1)", 10, 10, 30, 1),
        word("Capital", 50, 10, 80, 1),
        word("de", 140, 10, 30, 1),
        word("Peru?", 180, 10, 60, 1),
        word("A)", 10, 40, 30, 2),
        word("Lima", 50, 40, 60, 2),
        word("B)", 10, 70, 30, 3),
        word("Quito", 50, 70, 60, 3),
        word("2)", 10, 100, 30, 4),
        word("Capital", 50, 100, 80, 4),
        word("de", 140, 100, 30, 4),
        word("Chile?", 180, 100, 60, 4),
        word("A)", 10, 130, 30, 5),
        word("Santiago", 50, 130, 90, 5),
        word("B)", 10, 160, 30, 6),
        word("Lima", 50, 160, 60, 6),
    ]
}

fn exam_png() -> tempfile::NamedTempFile {
    let mut img = RgbImage::from_pixel(300, 200, Rgb([255, 255, 255]));
    for y in 10..30 {
        for x in 10..40 {
            img.put_pixel(x, y, Rgb([220, 20, 30]));
        }
    }
    let file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
    img.save(file.path()).unwrap();
    file
}

fn ocr_config(engine: Arc<ScriptedOcr>, require_red: bool) -> ParseConfig {
    ParseConfig::builder()
        .ocr_engine(engine)
        .require_red_question_number(require_red)
        .build()
        .unwrap()
}

// ── Plain text ───────────────────────────────────────────────────────────────

#[test]
fn plain_text_file_end_to_end() {
    let file = text_file(
        "Examen parcial\n\n1) ¿Cuánto es 2+2?\nA) 3\nB) 4\nC) 5\nD) 6\nRespuesta: B\n\n\
         2) ¿Color del cielo?\nA) Verde\n*B) Azul\nC) Rojo\n"
            .as_bytes(),
        ".txt",
    );
    let questions = parse_questions_from_file(file.path(), None).unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].question, "¿Cuánto es 2+2?");
    assert_eq!(questions[0].options, vec!["A) 3", "B) 4", "C) 5", "D) 6"]);
    assert_eq!(questions[0].correct_option, Some(1));
    assert_eq!(questions[1].correct_answer(), Some("B) Azul"));
}

#[test]
fn merged_lines_parse_like_separate_lines() {
    let merged = "12) What is 2+2? A) 3 B) 4 C) 5 D) 6 Respuesta: B";
    let split = "12) What is 2+2?\nA) 3\nB) 4\nC) 5\nD) 6\nRespuesta: B";
    let a = parse_questions_from_text(merged, None);
    let b = parse_questions_from_text(split, None);
    assert_eq!(a, b);
    assert_eq!(a[0].correct_option, Some(1));
}

#[test]
fn latin1_file_falls_back() {
    let file = text_file(b"1) \xbfQu\xe9 es?\nA) uno\nB) dos\n", ".txt");
    let questions = parse_questions_from_file(file.path(), None).unwrap();
    assert_eq!(questions[0].question, "¿Qué es?");
}

#[test]
fn exhausted_encodings_report_what_was_tried() {
    let file = text_file(b"1) Qu\xe9?\nA) x\nB) y\n", ".txt");
    let config = ParseConfig::builder()
        .text_encodings(vec![TextEncoding::Utf8, TextEncoding::Utf8Sig])
        .build()
        .unwrap();
    match parse_questions_from_file(file.path(), Some(&config)) {
        Err(McqError::DecodingFailure { tried, .. }) => assert_eq!(tried, "utf-8, utf-8-sig"),
        other => panic!("expected DecodingFailure, got {other:?}"),
    }
}

#[test]
fn questions_without_enough_options_are_dropped() {
    let file = text_file(b"1) Only one choice here\nA) lonely\n2) Two choices\nA) x\nB) y\n", ".md");
    let questions = parse_questions_from_file(file.path(), None).unwrap();
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question, "Two choices");
}

#[test]
fn output_never_contains_markers() {
    let text = "[[RED]]1)[[/RED]] Pregunta [[RED]]roja[[/RED]]\n[[RED]]A) si[[/RED]]\nB) no";
    let questions = parse_questions_from_text(text, None);
    assert_eq!(questions.len(), 1);
    let json = serde_json::to_string(&questions).unwrap();
    assert!(!json.contains("[[RED]]"));
    assert!(!json.contains("[[/RED]]"));
    assert_eq!(questions[0].question, "Pregunta roja");
}

#[test]
fn parsing_is_repeatable() {
    let text = "1) Uno dos?\nA) x\n*B) y\n2) Tres cuatro?\nA) z\nB) w";
    let first = parse_questions_from_text(text, None);
    let second = parse_questions_from_text(text, None);
    assert_eq!(first, second);
}

// ── Format and path errors ───────────────────────────────────────────────────

#[test]
fn unsupported_extension_is_rejected() {
    let file = text_file(b"irrelevant", ".docx");
    match parse_questions_from_file(file.path(), None) {
        Err(McqError::UnsupportedFormat { extension }) => assert_eq!(extension, ".docx"),
        other => panic!("expected UnsupportedFormat, got {other:?}"),
    }
}

#[test]
fn missing_file_is_not_found() {
    let err = parse_questions_from_file("/no/such/exam.txt", None).unwrap_err();
    assert!(matches!(err, McqError::NotFound { .. }));
}

#[test]
fn invalid_config_is_rejected() {
    let err = ParseConfig::builder().ocr_dpi(10).build().unwrap_err();
    assert!(matches!(err, McqError::InvalidConfig(_)));
}

// ── Uploads ──────────────────────────────────────────────────────────────────

/// Remembers where it was saved so the test can check cleanup.
struct TrackingUpload {
    inner: MemoryUpload,
    saved_to: Mutex<Option<std::path::PathBuf>>,
}

impl Uploadable for TrackingUpload {
    fn filename(&self) -> Option<&str> {
        self.inner.filename()
    }

    fn save(&self, path: &Path) -> std::io::Result<()> {
        *self.saved_to.lock().unwrap() = Some(path.to_path_buf());
        self.inner.save(path)
    }
}

#[test]
fn upload_temp_file_is_removed_after_success() {
    let upload = TrackingUpload {
        inner: MemoryUpload::new("quiz.txt", "1) Primera pregunta\nA) x\nB) y\n"),
        saved_to: Mutex::new(None),
    };
    let questions = parse_questions_from_file(&upload, None).unwrap();
    assert_eq!(questions.len(), 1);

    let saved = upload.saved_to.lock().unwrap().clone().unwrap();
    assert!(!saved.exists(), "temp copy should be gone: {}", saved.display());
}

#[test]
fn upload_temp_file_is_removed_after_failure() {
    let upload = TrackingUpload {
        inner: MemoryUpload::new("quiz.txt", b"1) Qu\xe9?\nA) x\nB) y\n".to_vec()),
        saved_to: Mutex::new(None),
    };
    let config = ParseConfig::builder()
        .text_encodings(vec![TextEncoding::Utf8])
        .build()
        .unwrap();
    assert!(parse_questions_from_file(&upload, Some(&config)).is_err());

    let saved = upload.saved_to.lock().unwrap().clone().unwrap();
    assert!(!saved.exists());
}

#[test]
fn upload_with_unknown_extension_is_rejected_and_cleaned() {
    let upload = TrackingUpload {
        inner: MemoryUpload::new("quiz.odt", "whatever"),
        saved_to: Mutex::new(None),
    };
    let err = parse_questions_from_file(&upload, None).unwrap_err();
    assert!(matches!(err, McqError::UnsupportedFormat { .. }));
    let saved = upload.saved_to.lock().unwrap().clone().unwrap();
    assert!(!saved.exists());
}

// ── Images through a scripted OCR engine ─────────────────────────────────────

#[test]
fn image_words_over_red_pixels_are_tagged() {
    let png = exam_png();
    let engine = ScriptedOcr::new(exam_words());
    let text = extract_text_from_image(png.path(), &ocr_config(engine.clone(), false)).unwrap();

    let rendered = text.to_string();
    assert!(
        rendered.starts_with("[[RED]]1)[[/RED]] Capital de Peru?"),
        "got: {rendered}"
    );
    assert!(rendered.contains("\n2) Capital de Chile?"));
    // Standalone images carry no DPI hint.
    assert_eq!(*engine.seen_dpi.lock().unwrap(), vec![None]);
}

#[test]
fn image_questions_without_red_mode() {
    let png = exam_png();
    let config = ocr_config(ScriptedOcr::new(exam_words()), false);
    let questions = parse_questions_from_file(png.path(), Some(&config)).unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(questions[0].options, vec!["A) Lima", "B) Quito"]);
    assert_eq!(questions[1].question, "Capital de Chile?");
}

#[test]
fn red_mode_keeps_only_red_numbered_questions() {
    let png = exam_png();
    let config = ocr_config(ScriptedOcr::new(exam_words()), true);
    let questions = parse_questions_from_file(png.path(), Some(&config)).unwrap();

    // Question 2 has a black numeral: its start line is dropped and its
    // options land in question 1.
    assert_eq!(questions.len(), 1);
    assert_eq!(questions[0].question, "Capital de Peru?");
    assert_eq!(
        questions[0].options,
        vec!["A) Lima", "B) Quito", "A) Santiago", "B) Lima"]
    );
}

#[test]
fn undecodable_image_is_an_extraction_failure() {
    let file = text_file(b"not a png at all", ".png");
    let config = ocr_config(ScriptedOcr::new(Vec::new()), false);
    let err = extract_text_from_image(file.path(), &config).unwrap_err();
    assert!(matches!(err, McqError::ExtractionFailure { .. }));
}

#[test]
fn ocr_errors_propagate() {
    struct FailingOcr;
    impl OcrEngine for FailingOcr {
        fn recognize(
            &self,
            _image: &DynamicImage,
            _lang: &str,
            _dpi: Option<u32>,
        ) -> Result<Vec<OcrWord>, McqError> {
            Err(McqError::ExtractionFailure {
                page: None,
                detail: "engine offline".into(),
            })
        }
    }

    let png = exam_png();
    let config = ParseConfig::builder()
        .ocr_engine(Arc::new(FailingOcr))
        .build()
        .unwrap();
    let err = parse_questions_from_file(png.path(), Some(&config)).unwrap_err();
    assert!(err.to_string().contains("engine offline"));
}
