pub mod buffer;
pub mod sigmf;
pub mod window;

pub use buffer::DatasetBuffer;
pub use sigmf::{
    dataset_paths, read_dataset, Dataset, DatasetWriter, SigMfAnnotation, SigMfCapture,
    SigMfExtension, SigMfGlobal, SigMfMeta,
};
pub use window::{extract_window, SampleWindow};
