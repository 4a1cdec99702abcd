//! OCR: word boxes from an engine, reading-order lines, red tagging from pixels.
//!
//! The engine is a seam ([`OcrEngine`]); the default [`TesseractCli`] shells
//! out to `tesseract … tsv` and parses its word table. Line assembly and red
//! tagging are engine-independent:
//!
//! - words sharing a `(block, paragraph, line)` key form one line;
//! - lines keep the order in which their key first appeared;
//! - words within a line are ordered by left edge;
//! - a word is red when its pixel crop is reddish
//!   (see [`crate::geometry::is_reddish`]).

use crate::annotated::{AnnotatedLine, AnnotatedText};
use crate::config::ParseConfig;
use crate::error::McqError;
use crate::geometry::{is_reddish, BoundingBox};
use image::{DynamicImage, ImageFormat, RgbImage};
use std::collections::HashMap;
use std::fs::File;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const TSV_WORD_LEVEL: u32 = 5;

/// One recognised word.
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    /// Pixel box in the recognised image.
    pub bbox: BoundingBox,
    pub block: u32,
    pub paragraph: u32,
    pub line: u32,
}

impl OcrWord {
    fn line_key(&self) -> (u32, u32, u32) {
        (self.block, self.paragraph, self.line)
    }
}

/// An OCR engine producing positioned words.
///
/// `dpi` is the resolution the image was rendered at, when known; standalone
/// images pass `None` and the engine uses the file's own metadata.
pub trait OcrEngine: Send + Sync {
    fn recognize(
        &self,
        image: &DynamicImage,
        lang: &str,
        dpi: Option<u32>,
    ) -> Result<Vec<OcrWord>, McqError>;
}

/// Cooperative cancellation shared between the caller and a running OCR call.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ── Tesseract CLI engine ─────────────────────────────────────────────────────

/// Runs the `tesseract` binary on a temp PNG and reads its TSV output.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    path: String,
    timeout: Option<Duration>,
    cancel: Option<CancellationFlag>,
}

impl TesseractCli {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            timeout: None,
            cancel: None,
        }
    }

    /// Kill the process if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_cancel(mut self, flag: CancellationFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Engine configured from `tesseract_path`, `ocr_timeout_secs` and `cancel`.
    pub fn from_config(config: &ParseConfig) -> Self {
        let mut engine = Self::new(config.tesseract_path.clone());
        if let Some(secs) = config.ocr_timeout_secs {
            engine = engine.with_timeout(Duration::from_secs(secs));
        }
        if let Some(flag) = &config.cancel {
            engine = engine.with_cancel(flag.clone());
        }
        engine
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(CancellationFlag::is_cancelled)
    }

    /// Poll the child until it exits, the deadline passes or the flag is set.
    fn wait(&self, child: &mut Child) -> Result<ExitStatus, McqError> {
        let deadline = self.timeout.map(|t| Instant::now() + t);
        loop {
            if let Some(status) = child
                .try_wait()
                .map_err(|e| McqError::extraction(format!("waiting for tesseract: {e}")))?
            {
                return Ok(status);
            }

            let reason = if self.is_cancelled() {
                Some("OCR cancelled".to_string())
            } else if deadline.is_some_and(|d| Instant::now() >= d) {
                Some(format!(
                    "tesseract timed out after {}s",
                    self.timeout.map(|t| t.as_secs()).unwrap_or_default()
                ))
            } else {
                None
            };

            if let Some(reason) = reason {
                warn!("{reason}; killing tesseract");
                let _ = child.kill();
                let _ = child.wait();
                return Err(McqError::extraction(reason));
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

impl Default for TesseractCli {
    fn default() -> Self {
        Self::new("tesseract")
    }
}

impl OcrEngine for TesseractCli {
    fn recognize(
        &self,
        image: &DynamicImage,
        lang: &str,
        dpi: Option<u32>,
    ) -> Result<Vec<OcrWord>, McqError> {
        if self.is_cancelled() {
            return Err(McqError::extraction("OCR cancelled"));
        }

        let dir = tempfile::Builder::new()
            .prefix("mcq-ocr-")
            .tempdir()
            .map_err(|e| McqError::extraction(format!("creating OCR work dir: {e}")))?;
        let input = dir.path().join("page.png");
        let out_base = dir.path().join("out");
        let stderr_path = dir.path().join("stderr.log");

        image
            .save_with_format(&input, ImageFormat::Png)
            .map_err(|e| McqError::extraction(format!("writing OCR input image: {e}")))?;
        let stderr = File::create(&stderr_path)
            .map_err(|e| McqError::extraction(format!("creating OCR log: {e}")))?;

        let mut cmd = Command::new(&self.path);
        cmd.arg(&input).arg(&out_base).arg("-l").arg(lang);
        if let Some(dpi) = dpi {
            cmd.arg("--dpi").arg(dpi.to_string());
        }
        cmd.arg("tsv")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(stderr));

        debug!(lang, ?dpi, "Running {}", self.path);
        let mut child = cmd.spawn().map_err(|e| {
            McqError::extraction(format!(
                "failed to run tesseract (is it installed? path='{}'): {e}",
                self.path
            ))
        })?;
        let status = self.wait(&mut child)?;

        if !status.success() {
            let log = std::fs::read_to_string(&stderr_path).unwrap_or_default();
            return Err(McqError::extraction(format!(
                "tesseract exited with code {}: {}",
                status.code().unwrap_or(-1),
                log.trim()
            )));
        }

        let tsv = std::fs::read_to_string(out_base.with_extension("tsv"))
            .map_err(|e| McqError::extraction(format!("reading tesseract output: {e}")))?;
        Ok(parse_tsv(&tsv))
    }
}

/// Parse tesseract's TSV output into words.
///
/// Columns: `level page_num block_num par_num line_num word_num left top
/// width height conf text`. Only word-level rows with text are kept;
/// malformed rows are skipped.
pub fn parse_tsv(tsv: &str) -> Vec<OcrWord> {
    tsv.lines()
        .filter(|row| !row.starts_with("level"))
        .filter_map(parse_tsv_row)
        .collect()
}

fn parse_tsv_row(row: &str) -> Option<OcrWord> {
    let cols: Vec<&str> = row.splitn(12, '\t').collect();
    if cols.len() < 12 {
        return None;
    }
    let num = |i: usize| cols[i].trim().parse::<i32>().ok();

    if num(0)? as u32 != TSV_WORD_LEVEL {
        return None;
    }
    let text = cols[11].trim();
    if text.is_empty() {
        return None;
    }
    Some(OcrWord {
        text: text.to_string(),
        bbox: BoundingBox::from_ltwh(num(6)?, num(7)?, num(8)?, num(9)?),
        block: num(2)?.max(0) as u32,
        paragraph: num(3)?.max(0) as u32,
        line: num(4)?.max(0) as u32,
    })
}

// ── Line assembly ────────────────────────────────────────────────────────────

/// Run OCR on `image` and assemble annotated lines.
///
/// `dpi` is forwarded to the engine; see [`OcrEngine::recognize`].
pub fn ocr_image(
    image: &DynamicImage,
    dpi: Option<u32>,
    config: &ParseConfig,
) -> Result<AnnotatedText, McqError> {
    let engine: Arc<dyn OcrEngine> = match &config.ocr_engine {
        Some(engine) => Arc::clone(engine),
        None => Arc::new(TesseractCli::from_config(config)),
    };
    let words = engine.recognize(image, &config.ocr_lang, dpi)?;
    debug!(words = words.len(), "OCR finished");
    Ok(assemble_lines(&words, &image.to_rgb8()))
}

/// Group words into lines and tag red words from `pixels`.
pub fn assemble_lines(words: &[OcrWord], pixels: &RgbImage) -> AnnotatedText {
    let mut order: Vec<(u32, u32, u32)> = Vec::new();
    let mut groups: HashMap<(u32, u32, u32), Vec<&OcrWord>> = HashMap::new();

    for word in words.iter().filter(|w| !w.text.trim().is_empty()) {
        let key = word.line_key();
        groups
            .entry(key)
            .or_insert_with(|| {
                order.push(key);
                Vec::new()
            })
            .push(word);
    }

    let mut text = AnnotatedText::new();
    for key in order {
        let Some(mut line_words) = groups.remove(&key) else {
            continue;
        };
        line_words.sort_by(|a, b| a.bbox.x0.total_cmp(&b.bbox.x0));

        let mut line = AnnotatedLine::new();
        for word in line_words {
            line.push_word(word.text.trim(), crop_is_reddish(pixels, &word.bbox));
        }
        text.push_line(line);
    }
    text
}

/// Reddish test on the part of `bbox` that lies inside the image.
fn crop_is_reddish(image: &RgbImage, bbox: &BoundingBox) -> bool {
    if bbox.is_empty() {
        return false;
    }
    let (w, h) = image.dimensions();
    let clamp = |v: f32, max: u32| v.clamp(0.0, max as f32) as u32;
    let (x0, x1) = (clamp(bbox.x0, w), clamp(bbox.x1, w));
    let (y0, y1) = (clamp(bbox.top, h), clamp(bbox.bottom, h));
    if x1 <= x0 || y1 <= y0 {
        return false;
    }
    is_reddish((y0..y1).flat_map(|y| (x0..x1).map(move |x| image.get_pixel(x, y).0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t200\t100\t-1\t
4\t1\t1\t1\t1\t0\t10\t10\t150\t20\t-1\t
5\t1\t1\t1\t1\t1\t10\t10\t30\t20\t96.5\t1)
5\t1\t1\t1\t1\t2\t50\t10\t60\t20\t95.1\tCapital?
5\t1\t1\t1\t2\t1\t10\t40\t30\t20\t91.0\tA)
5\t1\t1\t1\t2\t2\t50\t40\t40\t20\t-1\t
5\t1\t1\t1\t2\t3\t50\t40\t40\t20\t90.2\tLima
garbage row
";

    fn word(text: &str, left: i32, top: i32, width: i32, line: u32) -> OcrWord {
        OcrWord {
            text: text.into(),
            bbox: BoundingBox::from_ltwh(left, top, width, 10),
            block: 1,
            paragraph: 1,
            line,
        }
    }

    fn white(w: u32, h: u32) -> RgbImage {
        RgbImage::from_pixel(w, h, Rgb([255, 255, 255]))
    }

    fn paint(img: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32, c: [u8; 3]) {
        for y in y0..y1 {
            for x in x0..x1 {
                img.put_pixel(x, y, Rgb(c));
            }
        }
    }

    #[test]
    fn parse_tsv_keeps_word_rows_with_text() {
        let words = parse_tsv(TSV);
        let texts: Vec<_> = words.iter().map(|w| w.text.as_str()).collect();
        assert_eq!(texts, vec!["1)", "Capital?", "A)", "Lima"]);
        assert_eq!(words[1].bbox, BoundingBox::new(50.0, 10.0, 110.0, 30.0));
        assert_eq!(words[2].line, 2);
    }

    #[test]
    fn lines_follow_first_appearance_and_left_order() {
        let words = vec![
            word("B)", 0, 20, 10, 2),
            word("Capital?", 40, 0, 30, 1),
            word("1)", 0, 0, 10, 1),
            word("Quito", 20, 20, 20, 2),
        ];
        let text = assemble_lines(&words, &white(100, 40));
        assert_eq!(text.to_string(), "B) Quito\n1) Capital?");
    }

    #[test]
    fn red_pixels_tag_the_word() {
        let mut img = white(100, 40);
        // Red ink covering about half of "B)".
        paint(&mut img, 0, 20, 10, 25, [220, 20, 20]);
        let words = vec![word("B)", 0, 20, 10, 2), word("Quito", 20, 20, 20, 2)];
        let text = assemble_lines(&words, &img);
        assert_eq!(text.to_string(), "[[RED]]B)[[/RED]] Quito");
    }

    #[test]
    fn dark_ink_is_not_red() {
        let mut img = white(100, 40);
        paint(&mut img, 0, 0, 10, 10, [30, 30, 30]);
        let text = assemble_lines(&[word("1)", 0, 0, 10, 1)], &img);
        assert!(!text.lines()[0].has_red());
    }

    #[test]
    fn boxes_outside_the_image_are_clamped_or_ignored() {
        let mut img = white(20, 20);
        paint(&mut img, 10, 10, 20, 20, [255, 0, 0]);
        let words = vec![
            word("edge", 10, 10, 50, 1),
            word("gone", 100, 100, 10, 2),
            OcrWord {
                bbox: BoundingBox::from_ltwh(5, 5, 0, 0),
                ..word("flat", 0, 0, 0, 3)
            },
        ];
        let text = assemble_lines(&words, &img);
        assert_eq!(text.to_string(), "[[RED]]edge[[/RED]]\ngone\nflat");
    }

    #[test]
    fn missing_binary_is_an_extraction_failure() {
        let engine = TesseractCli::new("/nonexistent/tesseract-binary");
        let img = DynamicImage::ImageRgb8(white(4, 4));
        match engine.recognize(&img, "eng", Some(300)) {
            Err(McqError::ExtractionFailure { page: None, detail }) => {
                assert!(detail.contains("tesseract-binary"), "got: {detail}")
            }
            other => panic!("expected ExtractionFailure, got {other:?}"),
        }
    }

    #[test]
    fn cancelled_before_start() {
        let flag = CancellationFlag::new();
        flag.cancel();
        let engine = TesseractCli::default().with_cancel(flag);
        let img = DynamicImage::ImageRgb8(white(4, 4));
        let err = engine.recognize(&img, "eng", None).unwrap_err();
        assert!(err.to_string().contains("cancelled"));
    }

    /// A stand-in `tesseract` that never finishes on its own.
    #[cfg(unix)]
    fn sleeping_engine(dir: &std::path::Path) -> TesseractCli {
        use std::os::unix::fs::PermissionsExt;
        let script = dir.join("slow-tesseract");
        std::fs::write(&script, "#!/bin/sh\nsleep 5\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
        TesseractCli::new(script.to_string_lossy())
    }

    #[cfg(unix)]
    #[test]
    fn slow_run_is_killed_after_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let engine = sleeping_engine(dir.path()).with_timeout(Duration::from_secs(1));
        let img = DynamicImage::ImageRgb8(white(4, 4));

        let started = Instant::now();
        match engine.recognize(&img, "eng", None) {
            Err(McqError::ExtractionFailure { detail, .. }) => {
                assert!(detail.contains("timed out"), "got: {detail}")
            }
            other => panic!("expected ExtractionFailure, got {other:?}"),
        }
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[cfg(unix)]
    #[test]
    fn running_process_is_killed_on_cancel() {
        let dir = tempfile::tempdir().unwrap();
        let flag = CancellationFlag::new();
        let engine = sleeping_engine(dir.path()).with_cancel(flag.clone());
        let img = DynamicImage::ImageRgb8(white(4, 4));

        let canceller = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(300));
            flag.cancel();
        });
        let started = Instant::now();
        let err = engine.recognize(&img, "eng", None).unwrap_err();
        canceller.join().unwrap();

        assert!(err.to_string().contains("cancelled"), "got: {err}");
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn configured_engine_takes_precedence() {
        struct Fixed;
        impl OcrEngine for Fixed {
            fn recognize(
                &self,
                _image: &DynamicImage,
                lang: &str,
                dpi: Option<u32>,
            ) -> Result<Vec<OcrWord>, McqError> {
                assert_eq!(lang, "spa+eng");
                assert_eq!(dpi, Some(150));
                Ok(vec![word("hola", 0, 0, 5, 1)])
            }
        }
        let config = ParseConfig::builder()
            .tesseract_path("/nonexistent")
            .ocr_engine(Arc::new(Fixed))
            .build()
            .unwrap();
        let img = DynamicImage::ImageRgb8(white(10, 10));
        let text = ocr_image(&img, Some(150), &config).unwrap();
        assert_eq!(text.to_string(), "hola");
    }
}
