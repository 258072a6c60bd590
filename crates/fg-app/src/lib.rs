/// Conversion orchestration and control surface for frameglyph.
///
/// `pipeline` drives sampler → mapper, `artifact` writes and reloads the
/// results, `control` exposes the engine used by the CLI.
pub mod artifact;
pub mod cli;
pub mod control;
pub mod pipeline;
