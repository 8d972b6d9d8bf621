//! The CDP client facade.
//!
//! Multiplexes one optional pipe transport and up to five WebSocket
//! connections against a single Chromium instance. Each outbound command
//! class gets a dedicated transport so nothing queues behind anything
//! slower than itself:
//!
//! | Method family | Channel |
//! |---|---|
//! | `Input.dispatchMouseEvent` | mouse socket |
//! | `Input.dispatchKeyEvent`, `Input.insertText` | keyboard socket |
//! | `Page.*`, `Runtime.*`, `Emulation.*`, `Network.*` | navigation socket |
//! | `Browser.*`, `Target.*` | browser socket |
//! | screencast control and frame acks | the frame-carrying transport |
//!
//! A large screencast frame in flight can therefore never delay a mouse
//! click, and a slow `Runtime.evaluate` never blocks keyboard input.
//!
//! In pipe mode the pipe carries screencast frames and the attached page
//! session; in port mode a fifth WebSocket to the page target carries
//! them instead.

use std::os::fd::OwnedFd;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::discovery;
use crate::error::CdpError;
use crate::framepool::{FramePool, FrameRef};
use crate::message::{CdpResponse, TransportEvent};
use crate::pipe::{PipeTransport, PipeTransportOptions};
use crate::protocol::{
    AddScriptToEvaluateOnNewDocumentParams, AttachToTargetParams, AttachToTargetResult,
    EvaluateParams, EvaluateResult, GetNavigationHistoryResult, GetTargetsResult,
    GrantPermissionsParams,
    HandleFileChooserParams, HandleJavaScriptDialogParams, NavigateParams, NavigateResult,
    NavigateToHistoryEntryParams, ReloadParams, ScreencastFrameAckParams,
    SetDeviceMetricsOverrideParams, SetDiscoverTargetsParams, SetDownloadBehaviorParams,
    SetInterceptFileChooserDialogParams, StartScreencastParams,
};
use crate::ws::{WsTransport, WsTransportOptions};

/// Default directory downloads are written into.
pub const DEFAULT_DOWNLOAD_DIR: &str = "/tmp/termweb-downloads";

/// Outbound command channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Mouse input socket.
    Mouse,
    /// Keyboard input socket.
    Keyboard,
    /// Navigation / evaluation / page-state socket.
    Nav,
    /// Browser-level socket (downloads, target discovery).
    Browser,
    /// The transport carrying screencast frames and their acks.
    Screencast,
}

/// Route a CDP method to its channel.
pub fn route_method(method: &str) -> Channel {
    match method {
        "Input.dispatchMouseEvent" => Channel::Mouse,
        "Input.dispatchKeyEvent" | "Input.insertText" => Channel::Keyboard,
        "Page.startScreencast" | "Page.stopScreencast" | "Page.screencastFrameAck" => {
            Channel::Screencast
        }
        m if m.starts_with("Browser.") || m.starts_with("Target.") => Channel::Browser,
        _ => Channel::Nav,
    }
}

/// Options for client construction.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Directory Chromium writes downloads into.
    pub download_dir: String,
    /// Scripts injected into every new document.
    pub init_scripts: Vec<String>,
    /// Blocking command timeout applied to every transport.
    pub command_timeout: Duration,
    /// WebSocket keepalive idle interval.
    pub keepalive_interval: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            download_dir: DEFAULT_DOWNLOAD_DIR.to_string(),
            init_scripts: Vec::new(),
            command_timeout: crate::ws::DEFAULT_COMMAND_TIMEOUT,
            keepalive_interval: crate::ws::DEFAULT_KEEPALIVE_INTERVAL,
        }
    }
}

impl ClientOptions {
    /// Create options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the download directory.
    #[must_use]
    pub fn download_dir(mut self, dir: impl Into<String>) -> Self {
        self.download_dir = dir.into();
        self
    }

    /// Add a script injected into every new document.
    #[must_use]
    pub fn init_script(mut self, source: impl Into<String>) -> Self {
        self.init_scripts.push(source.into());
        self
    }

    /// Set the blocking command timeout.
    #[must_use]
    pub fn command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Set the WebSocket keepalive idle interval.
    #[must_use]
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    fn ws_options(&self) -> WsTransportOptions {
        WsTransportOptions::new()
            .command_timeout(self.command_timeout)
            .keepalive_interval(self.keepalive_interval)
    }
}

/// The multiplexing CDP client.
#[derive(Debug)]
pub struct CdpClient {
    pipe: Option<PipeTransport>,
    mouse: WsTransport,
    keyboard: WsTransport,
    nav: WsTransport,
    browser: WsTransport,
    /// Port mode only: the page socket dedicated to screencast frames.
    screencast: Option<WsTransport>,
    pool: Arc<FramePool>,
    /// Pipe mode only: the attached page session.
    page_session_id: parking_lot::Mutex<Option<String>>,
    page_target_id: parking_lot::Mutex<String>,
    debug_port: u16,
    options: ClientOptions,
}

impl CdpClient {
    /// Connect to a Chromium started with `--remote-debugging-port`.
    ///
    /// Frames arrive on a dedicated WebSocket to the page target.
    ///
    /// # Errors
    ///
    /// Discovery and handshake failures during construction are fatal.
    #[instrument(level = "info", skip(options))]
    pub async fn init_from_port(debug_port: u16, options: ClientOptions) -> Result<Self, CdpError> {
        let (pool, frame_writer) = FramePool::new();
        let target = discovery::discover_page_target(debug_port).await?;
        let page_ws_url = target
            .web_socket_debugger_url
            .clone()
            .ok_or(CdpError::NoPageTarget)?;

        let (mouse, keyboard, nav) = Self::connect_page_sockets(&page_ws_url, &options).await?;
        let screencast = WsTransport::connect(
            &page_ws_url,
            options.ws_options().frame_writer(frame_writer),
        )
        .await?;
        screencast.start_reader();

        let browser = Self::connect_browser_socket(debug_port, &options).await?;

        let client = Self {
            pipe: None,
            mouse,
            keyboard,
            nav,
            browser,
            screencast: Some(screencast),
            pool,
            page_session_id: parking_lot::Mutex::new(None),
            page_target_id: parking_lot::Mutex::new(target.id),
            debug_port,
            options,
        };
        client.enable_domains().await?;
        client.configure_browser().await?;
        info!("CDP client ready (port mode)");
        Ok(client)
    }

    /// Connect to a Chromium started with `--remote-debugging-pipe`,
    /// taking ownership of our ends of the two pipes. The pipe carries
    /// screencast frames; `debug_port` still serves target discovery for
    /// the input and navigation sockets.
    ///
    /// # Errors
    ///
    /// Discovery, handshake, and attach failures during construction are
    /// fatal.
    #[instrument(level = "info", skip(read_fd, write_fd, options))]
    pub async fn init_from_pipe(
        read_fd: OwnedFd,
        write_fd: OwnedFd,
        debug_port: u16,
        options: ClientOptions,
    ) -> Result<Self, CdpError> {
        let (pool, frame_writer) = FramePool::new();
        let pipe = PipeTransport::from_fds(
            read_fd,
            write_fd,
            PipeTransportOptions::new()
                .command_timeout(options.command_timeout)
                .frame_writer(frame_writer),
        )?;
        Self::init_with_pipe(pipe, pool, debug_port, options).await
    }

    async fn init_with_pipe(
        pipe: PipeTransport,
        pool: Arc<FramePool>,
        debug_port: u16,
        options: ClientOptions,
    ) -> Result<Self, CdpError> {
        pipe.start_reader();

        let target = discovery::discover_page_target(debug_port).await?;
        let page_ws_url = target
            .web_socket_debugger_url
            .clone()
            .ok_or(CdpError::NoPageTarget)?;
        let (mouse, keyboard, nav) = Self::connect_page_sockets(&page_ws_url, &options).await?;
        let browser = Self::connect_browser_socket(debug_port, &options).await?;

        let client = Self {
            pipe: Some(pipe),
            mouse,
            keyboard,
            nav,
            browser,
            screencast: None,
            pool,
            page_session_id: parking_lot::Mutex::new(None),
            page_target_id: parking_lot::Mutex::new(target.id.clone()),
            debug_port,
            options,
        };

        // Attach before any page-level pipe command: the pipe's root
        // session is browser-level, so Page.enable there needs the
        // sessionId prefix from the attach. The target is re-discovered
        // over the pipe itself; the HTTP listing and the pipe session can
        // disagree briefly during startup.
        let pipe_target_id = client.pipe_page_target().await?;
        client.attach_to_page(&pipe_target_id).await?;
        client.enable_domains().await?;
        client.enable_pipe_domains().await?;
        client.configure_browser().await?;
        info!("CDP client ready (pipe mode)");
        Ok(client)
    }

    async fn connect_page_sockets(
        page_ws_url: &str,
        options: &ClientOptions,
    ) -> Result<(WsTransport, WsTransport, WsTransport), CdpError> {
        let (mouse, keyboard, nav) = futures_util::future::try_join3(
            WsTransport::connect(page_ws_url, options.ws_options()),
            WsTransport::connect(page_ws_url, options.ws_options()),
            WsTransport::connect(page_ws_url, options.ws_options()),
        )
        .await?;
        mouse.start_reader();
        keyboard.start_reader();
        nav.start_reader();
        Ok((mouse, keyboard, nav))
    }

    async fn connect_browser_socket(
        debug_port: u16,
        options: &ClientOptions,
    ) -> Result<WsTransport, CdpError> {
        let browser_ws_url = discovery::discover_browser_ws_url(debug_port).await?;
        let browser = WsTransport::connect(&browser_ws_url, options.ws_options()).await?;
        browser.start_reader();
        Ok(browser)
    }

    /// Enable the CDP domains the core consumes events from, on the
    /// navigation socket.
    async fn enable_domains(&self) -> Result<(), CdpError> {
        self.nav.send_command("Page.enable", None, None).await?;
        self.nav.send_command("Network.enable", None, None).await?;
        self.nav.send_command("Runtime.enable", None, None).await?;
        self.nav
            .send_command(
                "Page.setInterceptFileChooserDialog",
                Some(serde_json::to_value(SetInterceptFileChooserDialogParams {
                    enabled: true,
                })?),
                None,
            )
            .await?;
        for source in &self.options.init_scripts {
            self.nav
                .send_command(
                    "Page.addScriptToEvaluateOnNewDocument",
                    Some(serde_json::to_value(
                        AddScriptToEvaluateOnNewDocumentParams {
                            source: source.clone(),
                        },
                    )?),
                    None,
                )
                .await?;
        }
        Ok(())
    }

    /// Enable frame delivery domains on the pipe, under the page session.
    async fn enable_pipe_domains(&self) -> Result<(), CdpError> {
        let Some(pipe) = &self.pipe else { return Ok(()) };
        let session = self.page_session_id.lock().clone();
        pipe.send_command("Page.enable", None, session.as_deref())
            .await?;
        pipe.send_command("Runtime.enable", None, session.as_deref())
            .await?;
        Ok(())
    }

    /// Clipboard grants, download routing, and target discovery on the
    /// browser socket.
    async fn configure_browser(&self) -> Result<(), CdpError> {
        self.browser
            .send_command(
                "Browser.grantPermissions",
                Some(serde_json::to_value(GrantPermissionsParams::clipboard())?),
                None,
            )
            .await?;
        self.browser
            .send_command(
                "Browser.setDownloadBehavior",
                Some(serde_json::to_value(SetDownloadBehaviorParams::allow_into(
                    self.options.download_dir.clone(),
                ))?),
                None,
            )
            .await?;
        self.browser
            .send_command(
                "Target.setDiscoverTargets",
                Some(serde_json::to_value(SetDiscoverTargetsParams {
                    discover: true,
                })?),
                None,
            )
            .await?;
        Ok(())
    }

    /// Find the page target as the pipe session sees it.
    async fn pipe_page_target(&self) -> Result<String, CdpError> {
        let Some(pipe) = &self.pipe else {
            return Err(CdpError::Unsupported("target discovery requires the pipe"));
        };
        let payload = pipe.send_command("Target.getTargets", None, None).await?;
        let result: GetTargetsResult = parse_result(&payload)?;
        result
            .target_infos
            .into_iter()
            .find(|t| t.target_type == "page")
            .map(|t| t.target_id)
            .ok_or(CdpError::NoPageTarget)
    }

    /// Attach to a page target over the pipe, storing its flat session id.
    async fn attach_to_page(&self, target_id: &str) -> Result<(), CdpError> {
        let Some(pipe) = &self.pipe else {
            return Err(CdpError::Unsupported("attach requires the pipe transport"));
        };
        let payload = pipe
            .send_command(
                "Target.attachToTarget",
                Some(serde_json::to_value(AttachToTargetParams::flat(target_id))?),
                None,
            )
            .await?;
        let result: AttachToTargetResult = parse_result(&payload)?;
        debug!(session_id = %result.session_id, target_id, "Attached to page");
        *self.page_session_id.lock() = Some(result.session_id);
        *self.page_target_id.lock() = target_id.to_string();
        Ok(())
    }

    /// Send a command on an explicit channel and wait for its response
    /// payload.
    pub async fn send_on(
        &self,
        channel: Channel,
        method: &str,
        params: Option<Value>,
    ) -> Result<Bytes, CdpError> {
        match self.transport_for(channel) {
            ChannelTransport::Ws(ws) => ws.send_command(method, params, None).await,
            ChannelTransport::Pipe(pipe) => {
                let session = self.session_for(method);
                pipe.send_command(method, params, session.as_deref()).await
            }
        }
    }

    /// Fire-and-forget send on an explicit channel; errors are swallowed.
    pub async fn send_on_async(&self, channel: Channel, method: &str, params: Value) {
        match self.transport_for(channel) {
            ChannelTransport::Ws(ws) => ws.send_command_async(method, Some(params), None).await,
            ChannelTransport::Pipe(pipe) => {
                let session = self.session_for(method);
                pipe.send_command_async(method, Some(params), session.as_deref())
                    .await;
            }
        }
    }

    /// Send a command on the channel its method routes to, parsing the
    /// typed result.
    pub async fn send<R: DeserializeOwned>(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> Result<R, CdpError> {
        let payload = self.send_on(route_method(method), method, params).await?;
        parse_result(&payload)
    }

    fn transport_for(&self, channel: Channel) -> ChannelTransport<'_> {
        match channel {
            Channel::Mouse => ChannelTransport::Ws(&self.mouse),
            Channel::Keyboard => ChannelTransport::Ws(&self.keyboard),
            Channel::Nav => ChannelTransport::Ws(&self.nav),
            Channel::Browser => ChannelTransport::Ws(&self.browser),
            Channel::Screencast => match (&self.pipe, &self.screencast) {
                (Some(pipe), _) => ChannelTransport::Pipe(pipe),
                (None, Some(ws)) => ChannelTransport::Ws(ws),
                // Screencast channel always exists in one of the modes;
                // route leftovers to nav rather than panic.
                (None, None) => ChannelTransport::Ws(&self.nav),
            },
        }
    }

    /// Page-level pipe commands carry the attached session id; browser and
    /// target management commands run on the root session.
    fn session_for(&self, method: &str) -> Option<String> {
        if method.starts_with("Target.") || method.starts_with("Browser.") {
            return None;
        }
        self.page_session_id.lock().clone()
    }

    // -----------------------------------------------------------------
    // Typed page operations

    /// Navigate the page.
    #[instrument(level = "info", skip(self))]
    pub async fn navigate(&self, url: &str) -> Result<NavigateResult, CdpError> {
        self.send(
            "Page.navigate",
            Some(serde_json::to_value(NavigateParams {
                url: url.to_string(),
            })?),
        )
        .await
    }

    /// Reload the page.
    pub async fn reload(&self, ignore_cache: bool) -> Result<(), CdpError> {
        self.send_on(
            Channel::Nav,
            "Page.reload",
            Some(serde_json::to_value(ReloadParams {
                ignore_cache: Some(ignore_cache),
            })?),
        )
        .await?;
        Ok(())
    }

    /// Stop the current load.
    pub async fn stop_loading(&self) -> Result<(), CdpError> {
        self.send_on(Channel::Nav, "Page.stopLoading", None).await?;
        Ok(())
    }

    /// Fetch the navigation history.
    pub async fn navigation_history(&self) -> Result<GetNavigationHistoryResult, CdpError> {
        self.send("Page.getNavigationHistory", None).await
    }

    /// Navigate to a history entry (back/forward).
    pub async fn navigate_to_history_entry(&self, entry_id: i64) -> Result<(), CdpError> {
        self.send_on(
            Channel::Nav,
            "Page.navigateToHistoryEntry",
            Some(serde_json::to_value(NavigateToHistoryEntryParams {
                entry_id,
            })?),
        )
        .await?;
        Ok(())
    }

    /// Evaluate an expression, returning its value.
    pub async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        let result: EvaluateResult = self
            .send(
                "Runtime.evaluate",
                Some(serde_json::to_value(EvaluateParams::by_value(expression))?),
            )
            .await?;
        Ok(result.result.value.unwrap_or(Value::Null))
    }

    /// Resize the browser viewport.
    pub async fn set_device_metrics(&self, width: u32, height: u32) -> Result<(), CdpError> {
        self.send_on(
            Channel::Nav,
            "Emulation.setDeviceMetricsOverride",
            Some(serde_json::to_value(SetDeviceMetricsOverrideParams::desktop(
                width, height,
            ))?),
        )
        .await?;
        Ok(())
    }

    /// Start the screencast on the frame-carrying transport.
    pub async fn start_screencast(&self, params: StartScreencastParams) -> Result<(), CdpError> {
        self.send_on(
            Channel::Screencast,
            "Page.startScreencast",
            Some(serde_json::to_value(params)?),
        )
        .await?;
        Ok(())
    }

    /// Stop the screencast.
    pub async fn stop_screencast(&self) -> Result<(), CdpError> {
        self.send_on(Channel::Screencast, "Page.stopScreencast", None)
            .await?;
        Ok(())
    }

    /// Answer an intercepted file chooser.
    pub async fn handle_file_chooser(
        &self,
        accept: bool,
        files: Vec<String>,
    ) -> Result<(), CdpError> {
        self.send_on(
            Channel::Nav,
            "Page.handleFileChooser",
            Some(serde_json::to_value(HandleFileChooserParams {
                action: if accept { "accept" } else { "cancel" }.to_string(),
                files,
            })?),
        )
        .await?;
        Ok(())
    }

    /// Answer a JavaScript dialog.
    pub async fn handle_dialog(
        &self,
        accept: bool,
        prompt_text: Option<String>,
    ) -> Result<(), CdpError> {
        self.send_on(
            Channel::Nav,
            "Page.handleJavaScriptDialog",
            Some(serde_json::to_value(HandleJavaScriptDialogParams {
                accept,
                prompt_text,
            })?),
        )
        .await?;
        Ok(())
    }

    // -----------------------------------------------------------------
    // Frames and events

    /// Acquire the latest screencast frame. In pipe mode this also emits
    /// the consumer-pull acknowledgement, releasing Chromium to send the
    /// next frame; the frame rate thereby follows the renderer's pace.
    ///
    /// The ack goes out before the acquisition so the returned frame
    /// reference (which pins its pool slot) is never held across the
    /// send. A frame arriving in between is acked on the next call.
    pub async fn acquire_latest_frame(&self) -> Option<FrameRef<'_>> {
        if self.pool.latest_generation().is_some() {
            if let Some(pipe) = &self.pipe {
                pipe.ack_pending_frame().await;
            }
        }
        self.pool.acquire_latest_frame()
    }

    /// The shared frame pool (for renderer-side generation checks).
    pub fn frame_pool(&self) -> &Arc<FramePool> {
        &self.pool
    }

    /// Pop the next queued event from any transport, navigation socket
    /// first. Events on one transport stay in FIFO order; ordering across
    /// transports is not defined.
    pub fn next_event(&self) -> Option<TransportEvent> {
        self.nav
            .next_event()
            .or_else(|| self.browser.next_event())
            .or_else(|| self.screencast.as_ref().and_then(WsTransport::next_event))
    }

    /// Whether a main-frame navigation was observed on the pipe since the
    /// last call.
    pub fn take_pipe_navigation_flag(&self) -> bool {
        self.pipe
            .as_ref()
            .is_some_and(PipeTransport::take_navigation_flag)
    }

    // -----------------------------------------------------------------
    // Session lifecycle

    /// The attached page session id, if any (pipe mode).
    pub fn page_session_id(&self) -> Option<String> {
        self.page_session_id.lock().clone()
    }

    /// The current page target id.
    pub fn page_target_id(&self) -> String {
        self.page_target_id.lock().clone()
    }

    /// Switch the attached session to another tab (pipe mode only).
    #[instrument(level = "info", skip(self))]
    pub async fn switch_to_target(&self, target_id: &str) -> Result<(), CdpError> {
        let Some(pipe) = &self.pipe else {
            return Err(CdpError::Unsupported("tab switching requires pipe mode"));
        };
        pipe.send_command(
            "Target.activateTarget",
            Some(serde_json::to_value(crate::protocol::ActivateTargetParams {
                target_id: target_id.to_string(),
            })?),
            None,
        )
        .await?;
        self.attach_to_page(target_id).await?;
        // The new session starts with no domains enabled.
        let session = self.page_session_id.lock().clone();
        pipe.send_command("Page.enable", None, session.as_deref())
            .await?;
        Ok(())
    }

    /// Rebuild the page-level sockets after a cross-origin navigation
    /// changed the page target: rediscover the WebSocket URL, tear down
    /// the mouse/keyboard/nav sockets, reconnect, and re-enable the event
    /// domains.
    #[instrument(level = "info", skip(self))]
    pub async fn reconnect_page_sockets(&mut self) -> Result<(), CdpError> {
        let target = discovery::discover_page_target(self.debug_port).await?;
        let page_ws_url = target
            .web_socket_debugger_url
            .clone()
            .ok_or(CdpError::NoPageTarget)?;
        debug!(url = %page_ws_url, "Reconnecting page sockets");

        self.mouse.close().await;
        self.keyboard.close().await;
        self.nav.close().await;

        let (mouse, keyboard, nav) =
            Self::connect_page_sockets(&page_ws_url, &self.options).await?;
        self.mouse = mouse;
        self.keyboard = keyboard;
        self.nav = nav;
        *self.page_target_id.lock() = target.id;

        self.nav.send_command("Runtime.enable", None, None).await?;
        self.nav.send_command("Page.enable", None, None).await?;
        Ok(())
    }

    /// Acknowledge a screencast frame by explicit session ids, on the
    /// frame-carrying transport. The pool-driven paths normally do this;
    /// the renderer uses it directly after a forced redraw.
    pub async fn ack_frame(&self, frame_session_id: i64) {
        let params = match serde_json::to_value(ScreencastFrameAckParams {
            session_id: frame_session_id,
        }) {
            Ok(params) => params,
            Err(_) => return,
        };
        self.send_on_async(Channel::Screencast, "Page.screencastFrameAck", params)
            .await;
    }

    /// Tear everything down. All teardown errors are swallowed; safe to
    /// call more than once.
    pub async fn close(&self) {
        if let Some(pipe) = &self.pipe {
            pipe.close().await;
        }
        if let Some(screencast) = &self.screencast {
            screencast.close().await;
        }
        self.mouse.close().await;
        self.keyboard.close().await;
        self.nav.close().await;
        self.browser.close().await;
        info!("CDP client closed");
    }
}

enum ChannelTransport<'a> {
    Ws(&'a WsTransport),
    Pipe(&'a PipeTransport),
}

/// Parse the `result` object out of a response payload.
fn parse_result<R: DeserializeOwned>(payload: &[u8]) -> Result<R, CdpError> {
    let response = CdpResponse::from_payload(payload)?;
    let result = response.into_result()?;
    serde_json::from_value(result)
        .map_err(|e| CdpError::InvalidResponse(format!("unexpected result shape: {e}")))
}
