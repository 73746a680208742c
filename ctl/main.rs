#![forbid(unsafe_code)]

//! `meeting-bridge-ctl`: local CLI companion for `meeting-bridge`.
//!
//! Connects to the IPC socket, sends one JSON command and prints the reply.
//! `listen` keeps the connection open and prints topic events as they
//! arrive.

use std::io::{BufRead, BufReader, Write};

use clap::{Args, Parser, Subcommand, ValueEnum};
use interprocess::local_socket::{traits::Stream as _, GenericNamespaced, Stream, ToNsName};

#[derive(Debug, Parser)]
#[command(
    name = "meeting-bridge-ctl",
    about = "Local CLI for the meeting-bridge server",
    version,
    long_about = None
)]
struct Cli {
    /// IPC socket name (must match the server's `ipc_name` config).
    #[arg(long, default_value = "meeting-bridge")]
    ipc_name: String,

    #[command(subcommand)]
    command: Command,
}

/// Meeting UI flags shared by the start and join commands.
#[derive(Debug, Args)]
struct MeetingFlags {
    /// Hide the invite button.
    #[arg(long)]
    disable_invite: bool,
    /// Hide the share button.
    #[arg(long)]
    disable_share: bool,
    /// Hide the title bar.
    #[arg(long)]
    disable_titlebar: bool,
    /// Disable driving mode.
    #[arg(long)]
    disable_drive: bool,
    /// Disable dial-in via phone.
    #[arg(long)]
    disable_dial_in: bool,
    /// Keep audio connected when the meeting UI is backgrounded.
    #[arg(long)]
    no_disconnect_audio: bool,
    /// Join without audio.
    #[arg(long)]
    no_audio: bool,
    /// Join with video off.
    #[arg(long)]
    no_video: bool,
    /// Hide meeting number and password in the meeting view.
    #[arg(long)]
    view_options: bool,
    /// Display name shown to other participants.
    #[arg(long)]
    display_name: Option<String>,
}

impl MeetingFlags {
    fn apply(&self, arguments: &mut serde_json::Map<String, serde_json::Value>) {
        let flags = [
            ("disableInvite", self.disable_invite),
            ("disableShare", self.disable_share),
            ("disableTitlebar", self.disable_titlebar),
            ("disableDrive", self.disable_drive),
            ("disableDialIn", self.disable_dial_in),
            ("noDisconnectAudio", self.no_disconnect_audio),
            ("noAudio", self.no_audio),
            ("noVideo", self.no_video),
            ("viewOptions", self.view_options),
        ];
        for (key, set) in flags {
            if set {
                arguments.insert(key.into(), "true".into());
            }
        }
        if let Some(ref name) = self.display_name {
            arguments.insert("displayName".into(), name.clone().into());
        }
    }
}

/// Topics `listen` can subscribe to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum TopicArg {
    /// Meeting status names.
    MeetingStatus,
    /// Local audio status ordinals.
    DeviceAudio,
}

impl TopicArg {
    fn wire_name(self) -> &'static str {
        match self {
            Self::MeetingStatus => "meeting_status",
            Self::DeviceAudio => "device_audio",
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Initialize the SDK.
    Init {
        /// Application key; falls back to the server's keychain entry.
        #[arg(long)]
        app_key: Option<String>,
        /// Application secret; falls back to the server's keychain entry.
        #[arg(long)]
        app_secret: Option<String>,
        /// Pre-signed SDK token.
        #[arg(long)]
        jwt_token: Option<String>,
        /// Web domain.
        #[arg(long)]
        domain: Option<String>,
    },

    /// Log in if needed and start an instant meeting.
    Login {
        /// Account identifier.
        #[arg(long)]
        user_id: Option<String>,
        /// Account password.
        #[arg(long)]
        password: Option<String>,
        #[command(flatten)]
        flags: MeetingFlags,
    },

    /// Join a meeting.
    Join {
        /// Meeting number.
        meeting_id: String,
        /// Meeting password.
        #[arg(long)]
        password: Option<String>,
        #[command(flatten)]
        flags: MeetingFlags,
    },

    /// Log in if needed and start a meeting by number.
    StartNormal {
        /// Meeting number.
        meeting_id: String,
        /// Account identifier.
        #[arg(long)]
        user_id: Option<String>,
        /// Account password.
        #[arg(long)]
        user_password: Option<String>,
        #[command(flatten)]
        flags: MeetingFlags,
    },

    /// Initialize, authenticate and join in one step.
    InitAndJoin {
        /// Meeting number.
        meeting_id: String,
        /// Meeting password.
        #[arg(long)]
        password: Option<String>,
        /// Application key.
        #[arg(long)]
        app_key: Option<String>,
        /// Application secret.
        #[arg(long)]
        app_secret: Option<String>,
        #[command(flatten)]
        flags: MeetingFlags,
    },

    /// Show the current meeting status.
    Status,

    /// Show meeting number and password.
    Details,

    /// Log out of the SDK.
    Logout,

    /// Leave the current meeting.
    Leave,

    /// Bring the meeting window to the front.
    Show,

    /// Minimize the meeting window.
    Hide,

    /// Show whether the microphone is muted.
    MicStatus,

    /// Mute or unmute the microphone.
    Mute {
        /// Unmute instead of mute.
        #[arg(long)]
        off: bool,
    },

    /// Stream topic events until interrupted.
    Listen {
        /// Topic to follow.
        #[arg(value_enum)]
        topic: TopicArg,
    },
}

type Arguments = serde_json::Map<String, serde_json::Value>;

fn insert_opt(arguments: &mut Arguments, key: &str, value: Option<&String>) {
    if let Some(value) = value {
        arguments.insert(key.into(), value.clone().into());
    }
}

fn request(method: &str, arguments: Arguments) -> serde_json::Value {
    serde_json::json!({ "method": method, "arguments": arguments })
}

fn build_request(command: &Command) -> serde_json::Value {
    let mut args = Arguments::new();
    match command {
        Command::Init {
            app_key,
            app_secret,
            jwt_token,
            domain,
        } => {
            insert_opt(&mut args, "appKey", app_key.as_ref());
            insert_opt(&mut args, "appSecret", app_secret.as_ref());
            insert_opt(&mut args, "jwtToken", jwt_token.as_ref());
            insert_opt(&mut args, "domain", domain.as_ref());
            request("init", args)
        }
        Command::Login {
            user_id,
            password,
            flags,
        } => {
            insert_opt(&mut args, "userId", user_id.as_ref());
            insert_opt(&mut args, "userPassword", password.as_ref());
            flags.apply(&mut args);
            request("login", args)
        }
        Command::Join {
            meeting_id,
            password,
            flags,
        } => {
            args.insert("meetingId".into(), meeting_id.clone().into());
            insert_opt(&mut args, "meetingPassword", password.as_ref());
            flags.apply(&mut args);
            request("join", args)
        }
        Command::StartNormal {
            meeting_id,
            user_id,
            user_password,
            flags,
        } => {
            args.insert("meetingId".into(), meeting_id.clone().into());
            insert_opt(&mut args, "userId", user_id.as_ref());
            insert_opt(&mut args, "userPassword", user_password.as_ref());
            flags.apply(&mut args);
            request("start_normal", args)
        }
        Command::InitAndJoin {
            meeting_id,
            password,
            app_key,
            app_secret,
            flags,
        } => {
            args.insert("meetingId".into(), meeting_id.clone().into());
            insert_opt(&mut args, "meetingPassword", password.as_ref());
            insert_opt(&mut args, "appKey", app_key.as_ref());
            insert_opt(&mut args, "appSecret", app_secret.as_ref());
            flags.apply(&mut args);
            request("init_and_join", args)
        }
        Command::Status => request("meeting_status", args),
        Command::Details => request("meeting_details", args),
        Command::Logout => request("logout", args),
        Command::Leave => request("leave_meeting", args),
        Command::Show => request("show_meeting", args),
        Command::Hide => request("hide_meeting", args),
        Command::MicStatus => request("get_mic_status", args),
        Command::Mute { off } => {
            args.insert("mute".into(), (!off).to_string().into());
            request("mute_my_audio", args)
        }
        Command::Listen { topic } => {
            serde_json::json!({ "method": "listen", "topic": topic.wire_name() })
        }
    }
}

fn main() {
    let args = Cli::parse();
    let request_json = build_request(&args.command);
    let follow = matches!(args.command, Command::Listen { .. });

    if let Err(err) = send_ipc_command(&args.ipc_name, &request_json, follow) {
        eprintln!("Failed to talk to server: {err}");
        eprintln!("Is meeting-bridge running with ipc_name '{}'?", args.ipc_name);
        std::process::exit(1);
    }
}

/// Print one response line; returns `false` for an error response.
fn print_response(response: &serde_json::Value) -> bool {
    let Some(obj) = response.as_object() else {
        println!("{response}");
        return true;
    };

    if obj.contains_key("event") {
        let data = obj.get("data").cloned().unwrap_or_default();
        println!("{data}");
        return true;
    }

    let ok = obj
        .get("ok")
        .and_then(serde_json::Value::as_bool)
        .unwrap_or(false);
    if ok {
        match obj.get("data") {
            Some(serde_json::Value::Null) | None => println!("OK"),
            Some(data) => println!("{}", serde_json::to_string_pretty(data).unwrap_or_default()),
        }
        true
    } else {
        let err_msg = obj
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error");
        eprintln!("Error: {err_msg}");
        false
    }
}

/// Connect to the IPC socket, send a JSON command, and print the response.
/// With `follow`, keep printing lines until the server closes the stream.
fn send_ipc_command(
    ipc_name: &str,
    request: &serde_json::Value,
    follow: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let name = ipc_name.to_ns_name::<GenericNamespaced>()?;
    let mut stream = Stream::connect(name)?;

    let mut request_line = serde_json::to_string(request)?;
    request_line.push('\n');
    stream.write_all(request_line.as_bytes())?;
    stream.flush()?;

    let reader = BufReader::new(&stream);
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let response: serde_json::Value = serde_json::from_str(line.trim())?;
        if !print_response(&response) {
            std::process::exit(1);
        }
        if !follow {
            break;
        }
    }
    Ok(())
}
