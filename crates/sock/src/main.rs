use anyhow::anyhow;
use notegrid_lib::{
    collate, filter, pin,
    view::{self, Neighbors, Page, ViewState},
    FilterSpec, Note, PinSet, SortSpec,
};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
};
use tracing::{debug, error, info};

#[derive(Serialize, Debug)]
#[serde(tag = "tag", content = "value")]
enum Result<T: Serialize> {
    Ok(T),
    InternalServerError(()),
}

fn internal_server_error_bytes() -> Vec<u8> {
    let out_buf = rmp_serde::to_vec_named(&Result::<()>::InternalServerError(()))
        .expect("Result::InternalServerError must serialize");

    debug!("Sending error bytes: {out_buf:x?}");

    out_buf
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct SortArgs {
    notes: Vec<Note>,
    sort: SortSpec,
    #[serde(default)]
    pinned: PinSet,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct FilterArgs {
    notes: Vec<Note>,
    filter: FilterSpec,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ToggleArgs {
    pinned: PinSet,
    path: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct TagMatchArgs {
    note_tag: String,
    filter_tag: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ViewArgs {
    notes: Vec<Note>,
    #[serde(default)]
    state: ViewState,
    #[serde(default)]
    offset: Option<usize>,
    #[serde(default)]
    limit: Option<usize>,
    /// When set, answer with this note's neighbors instead of a page.
    #[serde(default)]
    around: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "tag", content = "value")]
enum Request {
    Filter(FilterArgs),
    HasActiveFilter(FilterSpec),
    SortWithPins(SortArgs),
    TogglePin(ToggleArgs),
    AvailableFolders(Vec<Note>),
    AvailableTags(Vec<Note>),
    TagMatchesFilter(TagMatchArgs),
    View(ViewArgs),
}

#[derive(Serialize, Debug)]
#[serde(tag = "tag", content = "value")]
enum Response<'a> {
    Notes(Vec<&'a Note>),
    Bool(bool),
    Pins(PinSet),
    Strings(Vec<String>),
    Page(Page<'a>),
    Neighbors(Option<Neighbors<'a>>),
}

impl Request {
    fn process(&self) -> Response<'_> {
        match self {
            Request::Filter(args) => {
                Response::Notes(filter::apply_filters(&args.notes, &args.filter))
            }
            Request::HasActiveFilter(spec) => Response::Bool(filter::has_active_filter(spec)),
            Request::SortWithPins(args) => {
                Response::Notes(pin::sort_with_pins(&args.notes, &args.sort, &args.pinned))
            }
            Request::TogglePin(args) => {
                Response::Pins(pin::toggle_pin(&args.pinned, &args.path))
            }
            Request::AvailableFolders(notes) => {
                Response::Strings(collate::available_folders(notes))
            }
            Request::AvailableTags(notes) => Response::Strings(collate::available_tags(notes)),
            Request::TagMatchesFilter(args) => Response::Bool(
                notegrid_lib::tag_matches_filter(&args.note_tag, &args.filter_tag),
            ),
            Request::View(args) => {
                let composed = view::compose(&args.notes, &args.state);
                match &args.around {
                    Some(path) => Response::Neighbors(view::neighbors(&composed, path)),
                    None => Response::Page(view::paginate(composed, args.offset, args.limit)),
                }
            }
        }
    }
}

fn in_buf_2_out_buf(in_buf: &[u8]) -> Vec<u8> {
    debug!("Received bytes: {in_buf:x?}");
    let req = match rmp_serde::from_slice::<Request>(in_buf) {
        Ok(req) => req,
        Err(err) => {
            error!("stream request decode failed: {err}");
            return internal_server_error_bytes();
        }
    };

    let resp = req.process();

    match rmp_serde::to_vec_named(&Result::Ok(resp)) {
        Ok(out_buf) => {
            debug!("Sending {} bytes", out_buf.len());
            out_buf
        }
        Err(err) => {
            error!("Failed to serialize response: {err}");
            internal_server_error_bytes()
        }
    }
}

const MAX_REQUEST_LEN: u32 = 64 * 1024 * 1024;

async fn write_frame(stream: &mut UnixStream, out_buf: &[u8]) -> std::io::Result<()> {
    let response_length = u32::try_from(out_buf.len())
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidData, err))?;
    stream.write_u32(response_length).await?;
    stream.write_all(out_buf).await
}

async fn serve_stream(mut stream: UnixStream) -> std::io::Result<()> {
    let mut buf = Vec::new();

    loop {
        let request_length = match stream.read_u32().await {
            Ok(n) => n,
            Err(err) if err.kind() == std::io::ErrorKind::UnexpectedEof => {
                debug!("stream terminated");
                return Ok(());
            }
            Err(err) => return Err(err),
        };
        debug!("received request length: {request_length}");

        if request_length > MAX_REQUEST_LEN {
            error!("request of {request_length} bytes is too large, closing stream");
            return write_frame(&mut stream, &internal_server_error_bytes()).await;
        }

        buf.resize(request_length as usize, 0);
        stream.read_exact(&mut buf).await?;

        write_frame(&mut stream, &in_buf_2_out_buf(&buf)).await?;
        debug!("resolved request/response");
    }
}

async fn accept_streams(listener: UnixListener) {
    info!("listening for streams...");
    while let Ok((stream, _addr)) = listener.accept().await {
        debug!("accepted stream");
        tokio::spawn(async move {
            if let Err(err) = serve_stream(stream).await {
                error!("stream failed: {err}");
            }
        });
    }
}

async fn run() -> anyhow::Result<()> {
    let mut args = std::env::args();
    let socket_path = args
        .nth(1)
        .ok_or_else(|| anyhow!("Expected a socket path as a first argument"))?;
    if let Some(wd) = args.next() {
        std::env::set_current_dir(wd)?;
    }

    let socket_path = std::path::Path::new(&socket_path);
    if socket_path.exists() {
        std::fs::remove_file(socket_path)?;
    }

    let listener = UnixListener::bind(socket_path)?;

    accept_streams(listener).await;

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
