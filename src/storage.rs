use crate::model::{PowerReading, Token};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

pub const STATE_FILE: &str = "state.json";
pub const POWER_FILE: &str = "pvpower";
pub const ERROR_FILE: &str = "error.log";

/* state.json: {"token": "..."} */
#[derive(Serialize, Deserialize)]
struct State {
    token: Token,
}

/// Files kept between runs.
#[derive(Debug, Clone)]
pub struct Storage {
    state_file: PathBuf,
    power_file: PathBuf,
    error_file: PathBuf,
}

fn temp_path(path: &Path) -> PathBuf {
    let mut tmp = OsString::from(path.as_os_str());
    tmp.push(".tmp");
    PathBuf::from(tmp)
}

/// Write `contents` next to `path`, returning the temporary file to move in place later.
fn stage(path: &Path, contents: &[u8]) -> Result<PathBuf, Error> {
    let tmp = temp_path(path);
    fs::write(&tmp, contents).map_err(|e| Error::Io(tmp.to_owned(), e))?;
    Ok(tmp)
}

fn commit(tmp: &Path, path: &Path) -> Result<(), Error> {
    fs::rename(tmp, path).map_err(|e| {
        let _ = fs::remove_file(tmp);
        Error::Io(path.to_owned(), e)
    })
}

/// Readers never see a half-written file.
fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), Error> {
    let tmp = stage(path, contents)?;
    commit(&tmp, path)
}

/// Keep one log record per line.
fn single_line(s: &str) -> String {
    s.replace('\r', "\\r").replace('\n', "\\n")
}

impl Storage {
    pub fn new(base_dir: &Path) -> Self {
        Storage {
            state_file: base_dir.join(STATE_FILE),
            power_file: base_dir.join(POWER_FILE),
            error_file: base_dir.join(ERROR_FILE),
        }
    }

    pub fn state_file(&self) -> &Path {
        &self.state_file
    }

    pub fn power_file(&self) -> &Path {
        &self.power_file
    }

    pub fn error_file(&self) -> &Path {
        &self.error_file
    }

    /// Token cached by the previous run. Anything unusable counts as no token.
    pub fn read_token(&self) -> Option<Token> {
        let contents = match fs::read_to_string(&self.state_file) {
            Ok(contents) => contents,
            Err(e) => {
                log::debug!("No cached token ({}): {}", self.state_file.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<State>(&contents) {
            Ok(state) if !state.token.as_str().trim().is_empty() => Some(state.token),
            Ok(_) => {
                log::warn!("Blank token in {}, ignoring", self.state_file.display());
                None
            }
            Err(e) => {
                log::warn!("Unreadable {}, ignoring: {}", self.state_file.display(), e);
                None
            }
        }
    }

    fn state_contents(&self, token: &Token) -> Result<Vec<u8>, Error> {
        let state = State {
            token: token.to_owned(),
        };
        serde_json::to_vec(&state).map_err(|e| Error::Io(self.state_file.to_owned(), e.into()))
    }

    pub fn write_token(&self, token: &Token) -> Result<(), Error> {
        write_atomic(&self.state_file, &self.state_contents(token)?)
    }

    pub fn write_power(&self, reading: &PowerReading) -> Result<(), Error> {
        write_atomic(&self.power_file, reading.to_string().as_bytes())
    }

    /// Persist token and reading together. Both files are fully staged before either one is
    /// replaced, so a failed write leaves the previous pair in place.
    pub fn write_outputs(&self, token: &Token, reading: &PowerReading) -> Result<(), Error> {
        let state_tmp = stage(&self.state_file, &self.state_contents(token)?)?;
        let power_tmp = match stage(&self.power_file, reading.to_string().as_bytes()) {
            Ok(tmp) => tmp,
            Err(e) => {
                let _ = fs::remove_file(&state_tmp);
                return Err(e);
            }
        };

        if let Err(e) = commit(&state_tmp, &self.state_file) {
            let _ = fs::remove_file(&power_tmp);
            return Err(e);
        }
        commit(&power_tmp, &self.power_file)
    }

    /// Append a two-line record: the error message, then its debug representation.
    pub fn append_error<E: fmt::Display + fmt::Debug>(&self, error: &E) -> Result<(), Error> {
        let record = format!(
            "{}\n{}\n",
            single_line(&error.to_string()),
            single_line(&format!("{:?}", error))
        );

        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.error_file)
            .and_then(|mut file| file.write_all(record.as_bytes()))
            .map_err(|e| Error::Io(self.error_file.to_owned(), e))
    }

    /// Log a failed run and append it to the error log. Problems writing the log are only
    /// reported through `log`.
    pub fn record_failure<E: fmt::Display + fmt::Debug>(&self, error: &E) {
        log::error!("Poll failed: {}", error);

        if let Err(log_err) = self.append_error(error) {
            log::error!("Unable to append to error log: {}", log_err);
        }
    }
}

#[cfg(test)]
pub(crate) fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "solarman-poller-{}-{}",
        name,
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api;

    #[test]
    fn token_round_trip() {
        let storage = Storage::new(&scratch_dir("token-round-trip"));
        assert_eq!(None, storage.read_token());

        storage.write_token(&Token("abc".to_string())).unwrap();
        assert_eq!(
            r#"{"token":"abc"}"#,
            fs::read_to_string(storage.state_file()).unwrap()
        );
        assert_eq!(Some(Token("abc".to_string())), storage.read_token());

        storage.write_token(&Token("def".to_string())).unwrap();
        assert_eq!(Some(Token("def".to_string())), storage.read_token());
    }

    #[test]
    fn unusable_state_is_ignored() {
        let storage = Storage::new(&scratch_dir("unusable-state"));

        for contents in ["", "not json", r#"{"token":""}"#, r#"{"token":null}"#, "\"abc\""] {
            fs::write(storage.state_file(), contents).unwrap();
            assert_eq!(None, storage.read_token(), "state: {}", contents);
        }
    }

    #[test]
    fn power_is_overwritten() {
        let dir = scratch_dir("power-overwrite");
        let storage = Storage::new(&dir);

        storage
            .write_power(&PowerReading::from_milliwatts(2_500_000.0))
            .unwrap();
        storage
            .write_power(&PowerReading::from_milliwatts(1234.0))
            .unwrap();

        assert_eq!("1.23", fs::read_to_string(storage.power_file()).unwrap());
        assert!(!dir.join("pvpower.tmp").exists());
    }

    #[test]
    fn write_into_missing_directory_fails() {
        let storage = Storage::new(&scratch_dir("missing-dir").join("nope"));

        match storage.write_power(&PowerReading::ZERO) {
            Err(Error::Io(path, _)) => assert!(path.ends_with("pvpower.tmp")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn outputs_are_written_together() {
        let dir = scratch_dir("outputs-together");
        let storage = Storage::new(&dir);

        storage
            .write_outputs(&Token("abc".to_string()), &PowerReading::from_milliwatts(1234.0))
            .unwrap();

        assert_eq!(Some(Token("abc".to_string())), storage.read_token());
        assert_eq!("1.23", fs::read_to_string(storage.power_file()).unwrap());
        assert!(!dir.join("state.json.tmp").exists());
        assert!(!dir.join("pvpower.tmp").exists());
    }

    #[test]
    fn failed_power_write_keeps_previous_state() {
        let dir = scratch_dir("outputs-power-fails");
        let storage = Storage::new(&dir);
        storage.write_token(&Token("old".to_string())).unwrap();
        storage.write_power(&PowerReading::from_milliwatts(500.0)).unwrap();
        fs::create_dir(dir.join("pvpower.tmp")).unwrap();

        let result = storage
            .write_outputs(&Token("new".to_string()), &PowerReading::from_milliwatts(1234.0));

        assert!(matches!(result, Err(Error::Io(_, _))));
        assert_eq!(Some(Token("old".to_string())), storage.read_token());
        assert_eq!("0.50", fs::read_to_string(storage.power_file()).unwrap());
        assert!(!dir.join("state.json.tmp").exists());
    }

    #[test]
    fn failures_are_recorded_even_without_log_directory() {
        let storage = Storage::new(&scratch_dir("record-missing-dir").join("nope"));

        storage.record_failure(&Error::NoReading("refused".to_string()));
        assert!(!storage.error_file().exists());
    }

    #[test]
    fn errors_are_appended() {
        let storage = Storage::new(&scratch_dir("error-append"));

        storage
            .append_error(&Error::Api(api::Error::ApiError("timed out".to_string())))
            .unwrap();
        storage
            .append_error(&Error::NoReading("code 2101019:\nauth invalid token".to_string()))
            .unwrap();

        let log = fs::read_to_string(storage.error_file()).unwrap();
        let lines: Vec<&str> = log.lines().collect();
        assert_eq!(
            vec![
                "Solarman API error: timed out",
                r#"Api(ApiError("timed out"))"#,
                r"No power reading obtained: code 2101019:\nauth invalid token",
                r#"NoReading("code 2101019:\nauth invalid token")"#,
            ],
            lines
        );
    }
}
