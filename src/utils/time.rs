use std::time::{SystemTime, UNIX_EPOCH};

pub fn timestamp() -> String {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(dur) => dur.as_secs().to_string(),
        Err(_) => "Error getting timestamp".to_string(),
    }
}

/// Local wall-clock time as `%Y-%m-%d %H:%M:%S`, falling back to Unix seconds.
#[cfg(unix)]
pub fn local_timestamp() -> String {
    // SAFETY: time/localtime_r/strftime only touch the buffers passed in
    unsafe {
        let now = libc::time(std::ptr::null_mut());
        let mut tm: libc::tm = std::mem::zeroed();
        if libc::localtime_r(&now, &mut tm).is_null() {
            return timestamp();
        }
        let mut buf = [0u8; 64];
        let fmt = b"%Y-%m-%d %H:%M:%S\0";
        let len = libc::strftime(
            buf.as_mut_ptr().cast::<libc::c_char>(),
            buf.len(),
            fmt.as_ptr().cast::<libc::c_char>(),
            &tm,
        );
        if len == 0 {
            return timestamp();
        }
        String::from_utf8_lossy(&buf[..len]).into_owned()
    }
}

#[cfg(not(unix))]
pub fn local_timestamp() -> String {
    timestamp()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format() {
        let ts = timestamp();
        assert!(ts.parse::<u64>().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_local_timestamp_shape() {
        let ts = local_timestamp();
        assert_eq!(ts.len(), 19, "Got {}", ts);
        assert_eq!(&ts[4..5], "-");
        assert_eq!(&ts[10..11], " ");
        assert_eq!(&ts[13..14], ":");
    }
}
