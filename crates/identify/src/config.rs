use clap::Parser;
use common::env_parse;
use inference::DEFAULT_EMBEDDING_DIM;
use std::path::PathBuf;

/// Input size used when the model does not report one.
pub const DEFAULT_INPUT_SIZE: (u32, u32) = (112, 112);

/// Writes one embedding line per listed image
#[derive(Debug, Clone, Parser)]
#[command(name = "identify")]
pub struct Args {
    /// Model file
    #[arg(short = 'm', value_name = "model_file", default_value = "./models/AT/SqueezeNet1.0-0000.params")]
    pub model: PathBuf,

    /// Directory holding the images named in the list
    #[arg(short = 'i', value_name = "image_dir", default_value = "./images/val/")]
    pub image_dir: PathBuf,

    /// Result file, created along with its parent directories
    #[arg(short = 'o', value_name = "save_file", default_value = "./result/result.txt")]
    pub save_file: PathBuf,

    /// Maximum number of images to process
    #[arg(short = 'r', value_name = "repeat_count", default_value_t = 500000)]
    pub repeat_count: usize,

    /// Image list, one file name per line
    #[arg(short = 'l', value_name = "list_name", default_value = "imageslist.txt")]
    pub list_name: PathBuf,
}

/// Values written per embedding line (`EMBEDDING_DIM`, default 512).
pub fn embedding_dim_from_env() -> usize {
    match env_parse::<usize>("EMBEDDING_DIM") {
        Some(dims) if dims > 0 => dims,
        _ => DEFAULT_EMBEDDING_DIM,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::{Cli, EXIT_FAILURE, parse_cli};
    use serial_test::serial;

    #[test]
    fn test_defaults() {
        let Cli::Run(args) = parse_cli::<Args>(["identify", "-l", "faces.txt"]) else {
            panic!("Expected arguments");
        };
        assert_eq!(args.model, PathBuf::from("./models/AT/SqueezeNet1.0-0000.params"));
        assert_eq!(args.image_dir, PathBuf::from("./images/val/"));
        assert_eq!(args.save_file, PathBuf::from("./result/result.txt"));
        assert_eq!(args.repeat_count, 500000);
        assert_eq!(args.list_name, PathBuf::from("faces.txt"));
    }

    #[test]
    fn test_all_flags() {
        let Cli::Run(args) = parse_cli::<Args>([
            "identify", "-m", "arcface.rknn", "-i", "faces/", "-o", "out/emb.txt", "-r", "3", "-l",
            "list.txt",
        ]) else {
            panic!("Expected arguments");
        };
        assert_eq!(args.model, PathBuf::from("arcface.rknn"));
        assert_eq!(args.image_dir, PathBuf::from("faces/"));
        assert_eq!(args.save_file, PathBuf::from("out/emb.txt"));
        assert_eq!(args.repeat_count, 3);
        assert_eq!(args.list_name, PathBuf::from("list.txt"));
    }

    #[test]
    #[serial]
    fn test_embedding_dim_from_env() {
        // SAFETY: serialised with every other env-mutating test
        unsafe { std::env::remove_var("EMBEDDING_DIM") };
        assert_eq!(embedding_dim_from_env(), 512);

        unsafe { std::env::set_var("EMBEDDING_DIM", "128") };
        assert_eq!(embedding_dim_from_env(), 128);

        unsafe { std::env::set_var("EMBEDDING_DIM", "0") };
        assert_eq!(embedding_dim_from_env(), 512);

        unsafe { std::env::remove_var("EMBEDDING_DIM") };
    }

    #[test]
    fn test_exit_codes() {
        assert!(matches!(parse_cli::<Args>(["identify"]), Cli::Exit(0)));
        assert!(matches!(parse_cli::<Args>(["identify", "-h"]), Cli::Exit(0)));
        assert!(matches!(
            parse_cli::<Args>(["identify", "-v", "val.txt"]),
            Cli::Exit(EXIT_FAILURE)
        ));
    }
}
