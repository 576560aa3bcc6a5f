pub const YOLO_MODEL_NAME: &str = "yolov8s.onnx";

/// COCO class id the detector reports for a person.
pub const PERSON_CLASS_ID: u32 = 0;

pub const DEFAULT_CONFIDENCE: f64 = 0.5;

/// Minimum continuous detection before an alert fires.
pub const DEFAULT_CONFIRM_DELAY_SECS: f64 = 1.0;

/// Minimum continuous absence before another alert may fire.
pub const DEFAULT_COOLDOWN_SECS: f64 = 10.0;

/// Blobs smaller than this many pixels are treated as sensor noise.
pub const DEFAULT_MIN_MOTION_AREA: u32 = 2000;

pub const DEFAULT_DIFF_THRESHOLD: u8 = 30;
pub const DEFAULT_BLUR_KERNEL: usize = 21;
pub const DEFAULT_DILATE_ITERATIONS: usize = 2;

/// Frames discarded while the camera settles (~2s at 30 fps).
pub const DEFAULT_WARMUP_FRAMES: usize = 60;

pub const DEFAULT_SHUTDOWN_GRACE_SECS: f64 = 3.0;

pub const DEFAULT_EVENT_LOG_PATH: &str = "Times.csv";

pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

pub const ALERT_SUBJECT: &str = "INTRUSION ALERT - Person detected";
pub const ALERT_ATTACHMENT_NAME: &str = "person_capture.jpg";
pub const DEFAULT_JPEG_QUALITY: u8 = 90;
