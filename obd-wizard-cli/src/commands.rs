//! Subcommand implementations

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use obd_wizard_client::{
    DeployerApi, HttpDeployerClient, InstallEvent, InstallMonitor, MonitorOptions,
    DEFAULT_FINISH_DELAY,
};
use obd_wizard_core::services::{ProgressAnimator, ReviewSummary, ANIMATION_FRAMES};
use obd_wizard_core::types::{FieldError, FieldPath, InstallStatus, ServiceInfo};
use obd_wizard_core::{CoreError, NodeConfigForm, Wizard, WizardStep};

use crate::config::WizardFile;

/// Walk the wizard up to the review step
///
/// Node settings from the file are replayed through the node form, so
/// duplicate addresses and coordinator mistakes surface the same way they
/// would while editing by hand.
pub fn prepare(file: &WizardFile, info: Option<&ServiceInfo>) -> anyhow::Result<Wizard> {
    let mut wizard = Wizard::new(file.draft(), file.selection());
    wizard.next_step()?;

    let form = wizard
        .node_form_mut()
        .context("node form missing on node config step")?;
    for diagnostic in fill_node_form(form, file, info) {
        tracing::warn!("{diagnostic}");
    }

    match wizard.next_step() {
        Ok(_) => {}
        Err(CoreError::FormInvalid(errors)) => {
            for error in &errors {
                tracing::error!("{error}");
            }
            bail!("node configuration has {} invalid field(s)", errors.len());
        }
        Err(e) => return Err(e.into()),
    }

    // cluster parameters are taken as given
    wizard.next_step()?;
    debug_assert_eq!(wizard.step(), WizardStep::CheckInfo);
    Ok(wizard)
}

fn fill_node_form(
    form: &mut NodeConfigForm,
    file: &WizardFile,
    info: Option<&ServiceInfo>,
) -> Vec<FieldError> {
    let mut diagnostics = Vec::new();

    if !file.zones.is_empty() {
        let defaults: Vec<_> = form.topology().zones().iter().map(|z| z.id.clone()).collect();
        for zone in &file.zones {
            let id = form.add_zone(Some(zone.name.clone()));
            match form.set_zone_servers(&id, &zone.servers) {
                Ok(found) => diagnostics.extend(found),
                Err(e) => diagnostics.push(FieldError::new(FieldPath::ZoneServers(id.clone()), e)),
            }
            if let Some(rootservice) = &zone.rootservice {
                if let Err(e) = form.set_zone_coordinator(&id, rootservice) {
                    diagnostics.push(FieldError::new(FieldPath::ZoneRootservice(id.clone()), e));
                }
            }
        }
        for id in &defaults {
            if let Err(e) = form.remove_zone_confirmed(id) {
                tracing::debug!("default zone {id} kept: {e}");
            }
        }
    }

    if let Some(section) = file.obproxy.as_ref().filter(|s| !s.servers.is_empty()) {
        diagnostics.extend(form.set_proxy_servers(&section.servers));
    }
    if let Some(section) = file.ocpexpress.as_ref().filter(|s| !s.servers.is_empty()) {
        diagnostics.extend(form.set_console_servers(&section.servers));
    }

    let auth = &file.deployment.auth;
    if auth.user.is_empty() {
        if let Some(info) = info {
            form.apply_service_info(info);
        }
    } else {
        form.set_user(&auth.user);
    }
    form.set_password(auth.password.clone());
    form.set_port(auth.port);
    if let Some(home_path) = &file.deployment.home_path {
        form.set_home_path(home_path);
    }

    diagnostics
}

pub fn print_review(review: &ReviewSummary) {
    println!("Deployment {}", review.appname);
    if let Some(user) = &review.user {
        println!("  user:      {user}");
    }
    if let Some(home_path) = &review.home_path {
        println!("  home path: {home_path}");
    }
    if let Some(data_dir) = &review.data_dir {
        println!("  data dir:  {data_dir}");
    }
    for zone in &review.zones {
        println!(
            "  {}: {} (RootServer {})",
            zone.name,
            zone.servers.join(", "),
            zone.rootservice.as_deref().unwrap_or("-")
        );
    }
    for component in &review.components {
        println!(
            "  {} {}: {}",
            component.name,
            component.version,
            component.servers.join(", ")
        );
    }
}

pub fn validate(file: &WizardFile) -> anyhow::Result<()> {
    let wizard = prepare(file, None)?;
    print_review(&wizard.review());
    println!("Configuration is valid");
    Ok(())
}

/// Validate and create the deployment configuration; leaves the wizard on
/// the install step
pub async fn submit(file: &WizardFile, client: &HttpDeployerClient) -> anyhow::Result<Wizard> {
    let info = match client.service_info().await {
        Ok(info) => Some(info),
        Err(e) => {
            tracing::warn!("Could not read deployer environment: {e}");
            None
        }
    };

    let mut wizard = prepare(file, info.as_ref())?;
    print_review(&wizard.review());

    let name = wizard.config().name().to_string();
    client
        .create_deployment_config(&name, wizard.config())
        .await
        .with_context(|| format!("failed to create deployment '{name}'"))?;
    wizard.next_step()?;
    tracing::info!("Deployment '{name}' submitted");
    Ok(wizard)
}

/// Follow the install task until it ends or Ctrl-C is pressed
///
/// Progress is animated between polls, so the percentage moves smoothly
/// instead of jumping once per interval.
pub async fn watch(
    client: &HttpDeployerClient,
    name: &str,
    file: &WizardFile,
) -> anyhow::Result<InstallStatus> {
    let poll_interval = file.server.poll_interval();
    let api: Arc<dyn DeployerApi> = Arc::new(client.polling());
    let monitor = InstallMonitor::new(api, name).with_options(MonitorOptions {
        poll_interval,
        finish_delay: DEFAULT_FINISH_DELAY,
    });
    let cancel = monitor.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, stopping install monitor");
            cancel.cancel();
        }
    });

    let mut handle = monitor.spawn();
    let mut progress = ProgressLine::default();
    let mut frames = tokio::time::interval(frame_interval(poll_interval));
    frames.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            event = handle.next_event() => {
                let Some(event) = event else { break };
                match event {
                    InstallEvent::Progress(ratio) => progress.retarget(ratio),
                    InstallEvent::Status(task) => {
                        if let Some(current) = &task.current {
                            tracing::debug!("{current} ({}/{})", task.finished, task.total);
                        }
                    }
                    InstallEvent::Log(chunk) => print!("{}", chunk.log),
                    InstallEvent::Error(entry) => tracing::warn!("{}", entry.message),
                    InstallEvent::Finished(status) => {
                        if let Some(percent) = progress.settle() {
                            println!("progress {percent}%");
                        }
                        println!("install finished: {status:?}");
                    }
                }
            }
            _ = frames.tick() => {
                if let Some(percent) = progress.frame() {
                    println!("progress {percent}%");
                }
            }
        }
    }

    let outcome = handle.join().await.context("install monitor crashed")?;
    match outcome.status {
        Some(status) => Ok(status),
        None => bail!("install monitoring cancelled"),
    }
}

fn frame_interval(poll_interval: Duration) -> Duration {
    (poll_interval / ANIMATION_FRAMES).max(Duration::from_millis(1))
}

/// Percentage line fed by polled progress
#[derive(Debug, Default)]
struct ProgressLine {
    animator: ProgressAnimator,
    last: Option<u32>,
}

impl ProgressLine {
    fn retarget(&mut self, ratio: f64) {
        self.animator.retarget(ratio);
    }

    /// Percent to print after one animation frame, if it changed
    fn frame(&mut self) -> Option<u32> {
        self.animator.tick();
        self.changed(self.animator.shown())
    }

    /// Jump to the last polled value
    fn settle(&mut self) -> Option<u32> {
        self.changed(self.animator.target())
    }

    fn changed(&mut self, value: f64) -> Option<u32> {
        let percent = percent(value);
        if self.last == Some(percent) {
            return None;
        }
        self.last = Some(percent);
        Some(percent)
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(value: f64) -> u32 {
    (value.clamp(0.0, 1.0) * 100.0).round() as u32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const BASE: &str = r#"
[deployment]
appname = "demo"
version = "4.2.2.0"
components = ["obproxy"]

[obproxy]
version = "4.2.3.0"
servers = ["10.0.0.1"]
"#;

    fn file(extra: &str) -> WizardFile {
        WizardFile::parse(&format!("{BASE}{extra}")).unwrap()
    }

    const ZONES: &str = r#"
[deployment.auth]
user = "admin"

[[zones]]
name = "zone1"
servers = ["10.0.0.1", "10.0.0.2"]
rootservice = "10.0.0.2"

[[zones]]
name = "zone2"
servers = ["10.0.0.3"]
"#;

    #[test]
    fn file_zones_replace_default_zones() {
        let wizard = prepare(&file(ZONES), None).unwrap();
        assert_eq!(wizard.step(), WizardStep::CheckInfo);

        let review = wizard.review();
        let names: Vec<_> = review.zones.iter().map(|z| z.name.as_str()).collect();
        assert_eq!(names, ["zone1", "zone2"]);
        assert_eq!(review.zones[0].rootservice.as_deref(), Some("10.0.0.2"));
        // single server zone picks its coordinator
        assert_eq!(review.zones[1].rootservice.as_deref(), Some("10.0.0.3"));
        assert_eq!(review.home_path.as_deref(), Some("/home/admin/demo"));
    }

    #[test]
    fn duplicate_address_fails_validation() {
        let zones = ZONES.replace(r#"servers = ["10.0.0.3"]"#, r#"servers = ["10.0.0.1"]"#);
        let err = prepare(&file(&zones), None).unwrap_err();
        assert!(err.to_string().contains("invalid field"));
    }

    #[test]
    fn foreign_coordinator_fails_validation() {
        let zones = ZONES.replace(r#"rootservice = "10.0.0.2""#, r#"rootservice = "10.0.0.9""#);
        assert!(prepare(&file(&zones), None).is_err());
    }

    #[test]
    fn user_comes_from_service_when_missing() {
        let zones = ZONES.replace("user = \"admin\"", "");
        let info = ServiceInfo {
            user: "root".to_string(),
        };
        let wizard = prepare(&file(&zones), Some(&info)).unwrap();
        let auth = wizard.config().auth.as_ref().unwrap();
        assert_eq!(auth.user, "root");
        assert_eq!(wizard.config().home_path.as_deref(), Some("/root/demo"));
    }

    #[test]
    fn missing_zones_leave_form_invalid() {
        assert!(prepare(&file(""), None).is_err());
    }

    #[test]
    fn progress_line_moves_in_frames() {
        let mut line = ProgressLine::default();
        assert_eq!(line.frame(), Some(0));
        assert_eq!(line.frame(), None);

        line.retarget(0.5);
        let printed: Vec<_> = (0..ANIMATION_FRAMES).filter_map(|_| line.frame()).collect();
        assert!(printed.len() > 40);
        assert_eq!(printed.last(), Some(&50));
        assert!(printed.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(line.frame(), None);
    }

    #[test]
    fn progress_line_settles_on_target() {
        let mut line = ProgressLine::default();
        line.retarget(0.4);
        line.frame();
        line.retarget(1.0);
        assert_eq!(line.settle(), Some(100));
        assert_eq!(line.settle(), None);
    }

    #[test]
    fn frames_split_the_poll_interval() {
        assert_eq!(frame_interval(Duration::from_millis(1000)), Duration::from_millis(10));
        assert_eq!(frame_interval(Duration::from_millis(50)), Duration::from_millis(1));
    }
}
