use wallflux_model::{
    ParameterError, ScenarioConfig, Schedule, SimulationError,
    config::{ExhaustConfig, IncidentFluxConfig},
    run,
};

fn build_error(edit: impl FnOnce(&mut ScenarioConfig)) -> ParameterError {
    let mut config = ScenarioConfig::reference();
    edit(&mut config);
    config.build().expect_err("scenario should be rejected")
}

#[test]
fn non_physical_parameters_fail_fast() {
    assert!(matches!(
        build_error(|c| c.wall_capacity = 0.0),
        ParameterError::NotPositive { name: "wall_capacity", .. }
    ));
    assert!(matches!(
        build_error(|c| c.wall_capacity = f64::INFINITY),
        ParameterError::NonFinite { name: "wall_capacity", .. }
    ));
    assert!(matches!(
        build_error(|c| c.recycling = 1.2),
        ParameterError::OutOfRange { name: "recycling", .. }
    ));
    assert!(matches!(
        build_error(|c| c.release.prefactor_s = -1e-12),
        ParameterError::NotPositive { name: "release.prefactor", .. }
    ));
    assert!(matches!(
        build_error(|c| c.release.activation_energy_ev = -0.5),
        ParameterError::Negative { name: "release.activation_energy", .. }
    ));
    assert!(matches!(
        build_error(|c| c.exhaust = ExhaustConfig::Proportional { pump_per_s: -1.0 }),
        ParameterError::Negative { name: "exhaust.pump", .. }
    ));
    assert!(matches!(
        build_error(|c| c.exhaust = ExhaustConfig::Constant { rate: -1e18 }),
        ParameterError::Negative { name: "exhaust.rate", .. }
    ));
    assert!(matches!(
        build_error(|c| c.incident_flux = IncidentFluxConfig::Confinement {
            confinement_time_s: -3.5
        }),
        ParameterError::NotPositive { name: "incident_flux.confinement_time", .. }
    ));
}

#[test]
fn inconsistent_initial_state_fails_fast() {
    assert!(matches!(
        build_error(|c| c.initial.plasma = -1.0),
        ParameterError::Negative { name: "initial.plasma", .. }
    ));
    assert!(matches!(
        build_error(|c| c.initial.wall = 2.0e23),
        ParameterError::OutOfRange { name: "initial.wall", .. }
    ));
}

#[test]
fn non_positive_wall_temperature_fails_fast() {
    let err = build_error(|c| c.wall_temperature = Schedule::Constant { value: 0.0 });
    assert!(matches!(
        err,
        ParameterError::NotPositive { name: "wall_temperature minimum", .. }
    ));

    let err = build_error(|c| {
        c.wall_temperature = Schedule::PowerRamp {
            base: 573.0,
            start: 10.0,
            amplitude: -100.0,
            duration: 5.0,
            exponent: 1.0,
        }
    });
    assert!(matches!(err, ParameterError::NotPositive { .. }));
}

#[test]
fn malformed_schedules_fail_fast() {
    let err = build_error(|c| {
        c.fueling = Schedule::Table {
            points: vec![[0.0, 1e22], [0.0, 2e22]],
        }
    });
    assert!(matches!(err, ParameterError::Schedule { name: "fueling", .. }));

    let err = build_error(|c| {
        c.fueling = Schedule::SmoothStep {
            base: 1e22,
            gain: 1.0,
            center: 10.0,
            width: 0.0,
        }
    });
    assert!(matches!(err, ParameterError::Schedule { name: "fueling", .. }));
}

#[test]
fn invalid_integration_settings_fail_fast() {
    let err = build_error(|c| c.t_end = -1.0);
    assert!(matches!(err, ParameterError::Integration(_)));

    let err = build_error(|c| c.max_steps = 0);
    assert!(matches!(err, ParameterError::Integration(_)));
}

#[test]
fn errors_describe_the_offending_parameter() {
    let err = SimulationError::from(build_error(|c| c.recycling = -0.1));
    let message = err.to_string();
    assert!(message.contains("recycling"), "{message}");
    assert!(message.contains("-0.1"), "{message}");
}

#[test]
fn non_finite_derivative_aborts_the_run() {
    let mut config = ScenarioConfig::reference();
    config.wall_temperature = Schedule::Constant { value: 573.0 };
    // Overflows to infinity once t^50 exceeds about 1.8e8, near t = 1.46.
    config.fueling = Schedule::PowerRamp {
        base: 1e22,
        start: 0.0,
        amplitude: 1e300,
        duration: 1.0,
        exponent: 50.0,
    };
    config.t_end = 10.0;

    let scenario = config.build().unwrap();
    let err = run(&scenario).unwrap_err();
    assert!(
        matches!(err, SimulationError::NumericalInstability(_)),
        "unexpected error: {err}"
    );
}

#[test]
fn exhausted_step_budget_aborts_the_run() {
    let mut config = ScenarioConfig::reference();
    config.max_steps = 5;

    let scenario = config.build().unwrap();
    let err = run(&scenario).unwrap_err();
    assert!(matches!(err, SimulationError::NumericalInstability(_)));
    assert!(err.to_string().contains("step budget"), "{err}");
}
