use crate::core::models::fragment::ReactionChannel;
use crate::core::tables::masses::MassTable;
use crate::engine::cancel::CancelToken;
use crate::engine::config::{Geometry, Setup, SweepConfig};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::{CurveSample, FragmentResult};
use crate::engine::sweep::{Sweep, VertexBeam, beam_at_vertex};
use tracing::{info, instrument};

/// Notifications emitted while a telescope run is in progress.
#[derive(Debug, Clone, Copy)]
pub enum SweepEvent<'a> {
    Started {
        channel: &'a ReactionChannel,
        total_samples: usize,
    },
    Sample {
        channel: &'a ReactionChannel,
        sample: &'a CurveSample,
    },
    /// End-of-sweep marker; always follows the last sample of the channel.
    Finished { result: &'a FragmentResult },
}

#[derive(Debug, Clone, PartialEq)]
pub struct TelescopeResult {
    pub vertex: VertexBeam,
    pub geometry: Geometry,
    pub fragments: Vec<FragmentResult>,
}

pub fn run(
    setup: &Setup,
    config: &SweepConfig,
    masses: &MassTable,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
) -> Result<TelescopeResult, EngineError> {
    run_streaming(setup, config, masses, reporter, cancel, &mut |_| {})
}

/// Runs every configured fragment in turn, forwarding samples as they are produced.
#[instrument(skip_all, name = "telescope_workflow")]
pub fn run_streaming(
    setup: &Setup,
    config: &SweepConfig,
    masses: &MassTable,
    reporter: &ProgressReporter,
    cancel: &CancelToken,
    sink: &mut dyn FnMut(SweepEvent<'_>),
) -> Result<TelescopeResult, EngineError> {
    reporter.report(Progress::PhaseStart {
        name: "Beam transport".to_string(),
    });
    let vertex = beam_at_vertex(setup)?;
    info!(
        beam = %setup.beam.nuclide,
        incident = setup.beam.energy,
        vertex = vertex.energy,
        "Beam transported to the reaction vertex"
    );
    reporter.report(Progress::PhaseFinish);

    let sweeps = config
        .fragments
        .iter()
        .map(|&fragment| Sweep::new(setup, config, fragment, vertex, masses))
        .collect::<Result<Vec<_>, _>>()?;

    let mut fragments = Vec::with_capacity(sweeps.len());
    for sweep in &sweeps {
        let channel = *sweep.channel();
        reporter.report(Progress::PhaseStart {
            name: channel.label(),
        });
        sink(SweepEvent::Started {
            channel: &channel,
            total_samples: config.excitation.len(),
        });

        let result = sweep.run(reporter, cancel, &mut |channel, sample| {
            sink(SweepEvent::Sample { channel, sample })
        })?;

        info!(
            channel = %channel,
            points = result.points().count(),
            gaps = result.gaps().count(),
            "Sweep finished"
        );
        sink(SweepEvent::Finished { result: &result });
        reporter.report(Progress::PhaseFinish);
        fragments.push(result);
    }

    Ok(TelescopeResult {
        vertex,
        geometry: config.geometry,
        fragments,
    })
}
