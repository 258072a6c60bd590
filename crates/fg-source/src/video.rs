// Décodage vidéo via ffmpeg en subprocess (std::process::Command).
// Prérequis : `ffmpeg` et `ffprobe` accessibles dans PATH.
//
// Architecture :
//   - `probe_video`       : interroge ffprobe pour obtenir width/height/fps/nb_frames
//   - `spawn_ffmpeg_pipe` : lance ffmpeg → flux raw RGB24 natif sur stdout
//   - `decode_loop`       : thread dédié, découpe le flux en frames, les envoie
//   - `VideoSource`       : consommateur paresseux, rejouable (relance ffmpeg)

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;

use flume::{Receiver, Sender};

use fg_core::config::DEFAULT_FALLBACK_FPS;
use fg_core::error::CoreError;
use fg_core::frame::MediaFrame;
use fg_core::traits::FrameSource;

/// Capacité du canal décodeur → consommateur.
const CHANNEL_CAPACITY: usize = 3;

/// Métadonnées extraites via ffprobe.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    /// Nominal frames per second (container rate, not measured).
    pub fps: f64,
    /// `nb_frames` when the container declares it.
    pub frame_count: Option<usize>,
}

/// Parse an ffprobe rational such as `"30000/1001"` or `"25"`.
///
/// Returns `None` for `0/0`, `N/A` and non-positive values.
#[must_use]
pub fn parse_rate(val: &str) -> Option<f64> {
    let val = val.trim();
    let mut parts = val.splitn(2, '/');
    let num: f64 = parts.next()?.trim().parse().ok()?;
    let den: f64 = match parts.next() {
        Some(d) => d.trim().parse().ok()?,
        None => 1.0,
    };
    if den <= 0.0 {
        return None;
    }
    let rate = num / den;
    (rate.is_finite() && rate > 0.0).then_some(rate)
}

/// Interpret `key=value` lines printed by ffprobe.
///
/// `r_frame_rate` (nominal) wins over `avg_frame_rate`; `fallback_fps` is
/// used when neither is usable. Returns `None` when no video stream size
/// was reported.
#[must_use]
pub fn parse_probe_output(text: &str, fallback_fps: f64) -> Option<VideoInfo> {
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut r_rate: Option<f64> = None;
    let mut avg_rate: Option<f64> = None;
    let mut frame_count: Option<usize> = None;

    for line in text.lines() {
        let Some((key, val)) = line.split_once('=') else {
            continue;
        };
        let val = val.trim();
        match key.trim() {
            "width" => width = val.parse().ok(),
            "height" => height = val.parse().ok(),
            "r_frame_rate" => r_rate = parse_rate(val),
            "avg_frame_rate" => avg_rate = parse_rate(val),
            "nb_frames" => frame_count = val.parse().ok(),
            _ => {}
        }
    }

    let (width, height) = (width?, height?);
    if width == 0 || height == 0 {
        return None;
    }
    Some(VideoInfo {
        width,
        height,
        fps: r_rate.or(avg_rate).unwrap_or(fallback_fps),
        frame_count,
    })
}

/// Interroge `ffprobe` pour obtenir les métadonnées du flux vidéo principal.
///
/// # Errors
/// `UnreadableMedia` si `ffprobe` est introuvable, échoue, ou si le fichier
/// ne contient aucun flux vidéo.
pub fn probe_video(path: &Path, fallback_fps: f64) -> Result<VideoInfo, CoreError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,r_frame_rate,avg_frame_rate,nb_frames",
            "-of",
            "default=noprint_wrappers=1",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .map_err(|e| CoreError::unreadable(path, format!("impossible de lancer ffprobe : {e}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CoreError::unreadable(path, stderr.trim()));
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let info = parse_probe_output(&text, fallback_fps)
        .ok_or_else(|| CoreError::unreadable(path, "aucun flux vidéo"))?;

    log::info!(
        "probe_video: {}x{} @ {:.3}fps ({:?} frames) : {}",
        info.width,
        info.height,
        info.fps,
        info.frame_count,
        path.display()
    );
    Ok(info)
}

/// Lance un processus `ffmpeg` qui écrit des frames RGB24 brutes sur stdout.
///
/// Chaque frame = `w × h × 3` bytes, taille native (le redimensionnement
/// se fait côté glyph mapper). `-noautorotate` garantit que la taille
/// annoncée par ffprobe est celle du flux.
///
/// # Errors
/// `UnreadableMedia` si ffmpeg ne peut pas être lancé.
pub fn spawn_ffmpeg_pipe(path: &Path) -> Result<Child, CoreError> {
    let child = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-nostdin", "-noautorotate", "-i"])
        .arg(path)
        .args([
            "-map", "0:v:0", "-f", "rawvideo", "-pix_fmt", "rgb24", "-an", "pipe:1",
        ])
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| CoreError::unreadable(path, format!("impossible de lancer ffmpeg : {e}")))?;
    log::debug!("ffmpeg spawné pour {}", path.display());
    Ok(child)
}

/// Result of filling one frame buffer from a pipe.
#[derive(Debug, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The buffer was filled.
    Full,
    /// End of stream after `n` bytes (0 = clean frame boundary).
    Eof(usize),
}

/// Lit exactement `buf.len()` bytes depuis `reader`.
///
/// # Errors
/// Any I/O error other than `Interrupted`.
pub fn read_exact_or_eof<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<ReadOutcome> {
    let mut total = 0usize;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => return Ok(ReadOutcome::Eof(total)),
            Ok(n) => total += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(ReadOutcome::Full)
}

/// Découpe un flux RGB24 en frames et les envoie dans `tx`.
///
/// Stops when the receiver is dropped. Returns the number of frames sent
/// and, if the stream ended badly, the error to report.
fn pump_frames<R: Read>(
    reader: &mut R,
    info: VideoInfo,
    tx: &Sender<Result<MediaFrame, CoreError>>,
) -> (usize, Option<CoreError>) {
    let frame_bytes = MediaFrame::byte_len(info.width, info.height);
    let mut sent = 0usize;
    loop {
        let mut buf = vec![0u8; frame_bytes];
        match read_exact_or_eof(reader, &mut buf) {
            Ok(ReadOutcome::Full) => {
                let frame = match MediaFrame::from_rgb(info.width, info.height, buf) {
                    Ok(f) => f,
                    Err(e) => return (sent, Some(e)),
                };
                if tx.send(Ok(frame)).is_err() {
                    // Consommateur parti (rewind ou drop).
                    return (sent, None);
                }
                sent += 1;
            }
            Ok(ReadOutcome::Eof(0)) => return (sent, None),
            Ok(ReadOutcome::Eof(partial)) => {
                return (
                    sent,
                    Some(CoreError::ConversionFailed {
                        frame_index: sent,
                        reason: format!("frame tronquée ({partial}/{frame_bytes} bytes)"),
                    }),
                );
            }
            Err(e) => {
                return (
                    sent,
                    Some(CoreError::ConversionFailed {
                        frame_index: sent,
                        reason: format!("erreur lecture pipe : {e}"),
                    }),
                );
            }
        }
    }
}

/// Boucle du thread de décodage.
fn decode_loop(
    path: &Path,
    mut child: Child,
    info: VideoInfo,
    tx: &Sender<Result<MediaFrame, CoreError>>,
) {
    let (sent, mut error) = match child.stdout.as_mut() {
        Some(stdout) => pump_frames(stdout, info, tx),
        None => (0, Some(CoreError::unreadable(path, "stdout ffmpeg indisponible"))),
    };

    if tx.is_disconnected() {
        let _ = child.kill();
        let _ = child.wait();
        log::debug!("Thread vidéo: consommateur parti après {sent} frames.");
        return;
    }

    // Un code de sortie non nul signale une erreur de décodage.
    match child.wait() {
        Ok(status) if !status.success() && error.is_none() => {
            error = Some(if sent == 0 {
                CoreError::unreadable(path, format!("ffmpeg a échoué ({status})"))
            } else {
                CoreError::ConversionFailed {
                    frame_index: sent,
                    reason: format!("ffmpeg a échoué ({status})"),
                }
            });
        }
        Ok(_) => {}
        Err(e) if error.is_none() => {
            error = Some(CoreError::ConversionFailed {
                frame_index: sent,
                reason: e.to_string(),
            });
        }
        Err(_) => {}
    }

    if let Some(e) = error {
        log::warn!("Thread vidéo: {e}");
        let _ = tx.send(Err(e));
    } else {
        log::info!("Thread vidéo: EOF après {sent} frames.");
    }
}

/// Source vidéo paresseuse : un thread décode pendant que l'appelant consomme.
///
/// Frames arrive in strictly increasing temporal order. [`rewind`] relaunches
/// the decoder from frame 0.
///
/// [`rewind`]: FrameSource::rewind
pub struct VideoSource {
    path: PathBuf,
    info: VideoInfo,
    rx: Option<Receiver<Result<MediaFrame, CoreError>>>,
    decoded: usize,
    finished: bool,
}

impl VideoSource {
    /// Probe and open `path` with the default fallback frame rate.
    ///
    /// # Errors
    /// `UnreadableMedia` if the file is missing, empty, or not a video.
    pub fn open(path: &Path) -> Result<Self, CoreError> {
        Self::open_with_fallback(path, DEFAULT_FALLBACK_FPS)
    }

    /// Probe and open `path`; `fallback_fps` is used when the container
    /// declares no usable rate.
    ///
    /// # Errors
    /// `UnreadableMedia` if the file is missing, empty, or not a video.
    pub fn open_with_fallback(path: &Path, fallback_fps: f64) -> Result<Self, CoreError> {
        let meta = std::fs::metadata(path).map_err(|e| CoreError::unreadable(path, e))?;
        if !meta.is_file() {
            return Err(CoreError::unreadable(path, "pas un fichier"));
        }
        if meta.len() == 0 {
            return Err(CoreError::unreadable(path, "fichier vide"));
        }

        let info = probe_video(path, fallback_fps)?;
        let mut source = Self {
            path: path.to_path_buf(),
            info,
            rx: None,
            decoded: 0,
            finished: false,
        };
        source.start_decoder()?;
        Ok(source)
    }

    fn start_decoder(&mut self) -> Result<(), CoreError> {
        let child = spawn_ffmpeg_pipe(&self.path)?;
        let (tx, rx) = flume::bounded(CHANNEL_CAPACITY);
        let path = self.path.clone();
        let info = self.info;
        thread::Builder::new()
            .name("fg-video".to_string())
            .spawn(move || decode_loop(&path, child, info, &tx))
            .map_err(|e| CoreError::unreadable(&self.path, e))?;
        self.rx = Some(rx);
        self.decoded = 0;
        self.finished = false;
        Ok(())
    }
}

impl FrameSource for VideoSource {
    fn next_frame(&mut self) -> Result<Option<MediaFrame>, CoreError> {
        if self.finished {
            return Ok(None);
        }
        let Some(rx) = self.rx.as_ref() else {
            return Ok(None);
        };
        match rx.recv() {
            Ok(Ok(frame)) => {
                self.decoded += 1;
                Ok(Some(frame))
            }
            Ok(Err(e)) => {
                self.finished = true;
                Err(e)
            }
            Err(flume::RecvError::Disconnected) => {
                self.finished = true;
                if self.decoded == 0 {
                    Err(CoreError::EmptyMedia {
                        path: self.path.clone(),
                    })
                } else {
                    Ok(None)
                }
            }
        }
    }

    fn frame_rate(&self) -> f64 {
        self.info.fps
    }

    fn frame_count_hint(&self) -> Option<usize> {
        self.info.frame_count
    }

    fn rewind(&mut self) -> Result<(), CoreError> {
        // Le drop du receiver arrête l'ancien thread au prochain envoi.
        self.rx = None;
        self.start_decoder()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn parse_rate_handles_rationals() {
        assert_eq!(parse_rate("24/1"), Some(24.0));
        assert_eq!(parse_rate("25"), Some(25.0));
        let ntsc = parse_rate("30000/1001").unwrap();
        assert!((ntsc - 29.97).abs() < 0.01);
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("N/A"), None);
    }

    #[test]
    fn probe_output_prefers_nominal_rate() {
        let text = "width=640\nheight=360\nr_frame_rate=25/1\navg_frame_rate=24/1\nnb_frames=250\n";
        let info = parse_probe_output(text, 24.0).unwrap();
        assert_eq!((info.width, info.height), (640, 360));
        assert!((info.fps - 25.0).abs() < f64::EPSILON);
        assert_eq!(info.frame_count, Some(250));
    }

    #[test]
    fn probe_output_falls_back() {
        let text = "width=320\nheight=240\nr_frame_rate=0/0\navg_frame_rate=0/0\nnb_frames=N/A\n";
        let info = parse_probe_output(text, 12.0).unwrap();
        assert!((info.fps - 12.0).abs() < f64::EPSILON);
        assert_eq!(info.frame_count, None);
    }

    #[test]
    fn probe_output_without_stream_is_none() {
        assert!(parse_probe_output("", 24.0).is_none());
        assert!(parse_probe_output("width=0\nheight=10\n", 24.0).is_none());
    }

    #[test]
    fn read_exact_reports_partial_eof() {
        let mut reader = Cursor::new(vec![1u8, 2, 3, 4, 5]);
        let mut buf = [0u8; 3];
        assert_eq!(read_exact_or_eof(&mut reader, &mut buf).unwrap(), ReadOutcome::Full);
        assert_eq!(read_exact_or_eof(&mut reader, &mut buf).unwrap(), ReadOutcome::Eof(2));
        assert_eq!(read_exact_or_eof(&mut reader, &mut buf).unwrap(), ReadOutcome::Eof(0));
    }

    fn info(w: u32, h: u32) -> VideoInfo {
        VideoInfo {
            width: w,
            height: h,
            fps: 10.0,
            frame_count: None,
        }
    }

    #[test]
    fn pump_splits_stream_into_frames_in_order() {
        // 3 frames 1x1 RGB.
        let mut reader = Cursor::new(vec![1u8, 1, 1, 2, 2, 2, 3, 3, 3]);
        let (tx, rx) = flume::unbounded();
        let (sent, err) = pump_frames(&mut reader, info(1, 1), &tx);
        assert_eq!(sent, 3);
        assert!(err.is_none());
        drop(tx);
        let firsts: Vec<u8> = rx.iter().map(|f| f.unwrap().data[0]).collect();
        assert_eq!(firsts, vec![1, 2, 3]);
    }

    #[test]
    fn pump_never_emits_a_partial_frame() {
        let mut reader = Cursor::new(vec![9u8; 3 * 4 + 5]);
        let (tx, rx) = flume::unbounded();
        let (sent, err) = pump_frames(&mut reader, info(2, 2), &tx);
        assert_eq!(sent, 1);
        assert!(matches!(
            err,
            Some(CoreError::ConversionFailed { frame_index: 1, .. })
        ));
        drop(tx);
        assert_eq!(rx.iter().count(), 1);
    }

    #[test]
    fn zero_byte_file_is_unreadable_before_probing() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert!(matches!(
            VideoSource::open(file.path()),
            Err(CoreError::UnreadableMedia { .. })
        ));
    }

    #[test]
    fn missing_file_is_unreadable() {
        assert!(matches!(
            VideoSource::open(Path::new("/nonexistent/clip.mp4")),
            Err(CoreError::UnreadableMedia { .. })
        ));
    }
}
