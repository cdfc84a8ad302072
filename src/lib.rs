use std::{
    fs::{File, OpenOptions},
    io::{self, BufReader, BufWriter, Read},
    path::{Path, PathBuf},
    sync::mpsc,
};

use threadpool::ThreadPool;

pub use cli::CLIParser;
pub use color::RGBColorFormat;
pub use error::{Error, ErrorKind};
pub use image::quantizer::UniformQuantizer;
pub use image::{ImageFormat, PixelFormat, Raster};
use image::{
    reader::bmp::BmpImageReader, writer::bmp::BmpImageWriter, ImageReader, ImageWriter,
};

mod cli;
pub mod color;
pub mod error;
pub mod image;
mod logger;

pub type Result<T> = std::result::Result<T, error::Error>;

const SINGLE_OUTPUT_FILE: &str = "output.bmp";
const BATCH_OUTPUT_DIRECTORY: &str = ".";
const BATCH_OUTPUT_SUFFIX: &str = "unipal.bmp";

#[derive(Debug)]
pub struct Arguments {
    input_files: Vec<PathBuf>,
    output: Option<PathBuf>,
    dither: bool,
    number_of_threads: usize,
}

impl Arguments {
    /// Pairs every input with the file its result is written to.
    fn conversion_jobs(&self) -> Vec<ConversionJob> {
        if let [input_file] = self.input_files.as_slice() {
            let output_file = self
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(SINGLE_OUTPUT_FILE));
            return vec![ConversionJob::new(input_file.clone(), output_file)];
        }
        let directory = self
            .output
            .clone()
            .unwrap_or_else(|| PathBuf::from(BATCH_OUTPUT_DIRECTORY));
        self.input_files
            .iter()
            .map(|input_file| {
                let stem = input_file
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default();
                let output_file = directory.join(format!("{}.{}", stem, BATCH_OUTPUT_SUFFIX));
                ConversionJob::new(input_file.clone(), output_file)
            })
            .collect()
    }
}

#[derive(Clone, Debug)]
struct ConversionJob {
    input_file: PathBuf,
    output_file: PathBuf,
}

impl ConversionJob {
    fn new(input_file: PathBuf, output_file: PathBuf) -> Self {
        ConversionJob {
            input_file,
            output_file,
        }
    }

    fn run(self, dither: bool) -> ConversionReport {
        let result = quantize_bitmap(&self.input_file, &self.output_file, dither);
        if let Err(e) = &result {
            log::error!("Conversion of {} failed: {}", self.input_file.display(), e);
        }
        ConversionReport {
            input_file: self.input_file,
            output_file: self.output_file,
            result: Some(result),
        }
    }

    fn into_missing_report(self) -> ConversionReport {
        log::error!(
            "Conversion of {} stopped without a result",
            self.input_file.display()
        );
        ConversionReport {
            input_file: self.input_file,
            output_file: self.output_file,
            result: None,
        }
    }
}

/// Outcome of converting one input file. `result` is `None` when the worker
/// converting it died before reporting back.
#[derive(Debug)]
pub struct ConversionReport {
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub result: Option<Result<()>>,
}

impl ConversionReport {
    pub fn succeeded(&self) -> bool {
        matches!(self.result, Some(Ok(())))
    }
}

fn open_input_file(file_path: &Path) -> Result<File> {
    File::open(file_path).map_err(|e| {
        Error::UnableToOpenInputFileForReading(file_path.display().to_string(), e)
    })
}

fn open_output_file(file_path: &Path) -> Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(file_path)
        .map_err(|e| {
            Error::UnableToOpenOutputFileForWriting(file_path.display().to_string(), e)
        })
}

pub fn load_bitmap(file_path: &Path) -> Result<Raster> {
    let input_file = open_input_file(file_path)?;
    let mut reader = BmpImageReader::new(BufReader::new(input_file));
    reader.read_image()
}

pub fn save_bitmap(file_path: &Path, image: &Raster) -> Result<()> {
    let output_file = open_output_file(file_path)?;
    let mut output_file_writer = BufWriter::new(output_file);
    let mut writer = BmpImageWriter::new(&mut output_file_writer, image);
    writer.write_image()
}

/// Identifies a file by its first two bytes. Files shorter than that are
/// [`ImageFormat::Unknown`].
pub fn detect_format(file_path: &Path) -> Result<ImageFormat> {
    let mut input_file = open_input_file(file_path)?;
    let mut signature = [0; 2];
    match input_file.read_exact(&mut signature) {
        Ok(()) => Ok(ImageFormat::from_signature(signature)),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(ImageFormat::Unknown),
        Err(e) => Err(Error::FailedToReadFileHeader(e)),
    }
}

fn quantize_bitmap(input_file: &Path, output_file: &Path, dither: bool) -> Result<()> {
    log::info!("Loading {}", input_file.display());
    let image = load_bitmap(input_file)?;
    let quantizer = UniformQuantizer::new(dither);
    let output_image = quantizer.quantize(&image)?;
    log::info!("Saving {}", output_file.display());
    save_bitmap(output_file, &output_image)
}

/// Loads every input bitmap, reduces it to the uniform 256 color palette and
/// saves the result. Reports are returned in input order.
///
/// A single input is converted on the calling thread, several inputs are
/// spread over a pool of `number_of_threads` workers.
pub fn convert_to_uniform_palette(arguments: &Arguments) -> Vec<ConversionReport> {
    let jobs = arguments.conversion_jobs();
    if jobs.len() == 1 {
        return jobs
            .into_iter()
            .map(|job| job.run(arguments.dither))
            .collect();
    }

    let threadpool = ThreadPool::new(arguments.number_of_threads.max(1));
    let (sender, receiver) = mpsc::channel();
    for (position, job) in jobs.iter().cloned().enumerate() {
        let sender = sender.clone();
        let dither = arguments.dither;
        threadpool.execute(move || {
            // the receiver outlives every worker
            let _ = sender.send((position, job.run(dither)));
        });
    }
    drop(sender);

    let mut reports = jobs.iter().map(|_| None).collect::<Vec<_>>();
    for (position, report) in receiver {
        reports[position] = Some(report);
    }
    jobs.into_iter()
        .zip(reports)
        .map(|(job, report)| report.unwrap_or_else(|| job.into_missing_report()))
        .collect()
}
