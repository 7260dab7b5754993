mod utils;
#[allow(unused)]
use utils::*;

#[cfg(feature = "integration")]
mod tests {
    use super::*;
    use std::time::Duration;
    use surge::prelude::*;
    use std::num::NonZeroUsize;
    use surge::workload::{HttpRunner, Registry, WorkflowRunner};
    use surge_core::{ApiConfig, ApiMethod, WorkflowConfig, WorkloadConfig};

    fn workload(base: &str, apis: &[(&str, ApiMethod, &str)]) -> WorkloadConfig {
        WorkloadConfig {
            url: format!("http://{MOCK_ADDR}{base}"),
            is_original: true,
            apis: apis
                .iter()
                .map(|(name, method, generator)| ApiConfig {
                    name: name.to_string(),
                    method: *method,
                    proportion: 1,
                    generator: generator.to_string(),
                })
                .collect(),
            workflows: vec![],
        }
    }

    fn params(tput: u32) -> RunParameters {
        RunParameters::new(4, 0, Duration::from_secs(2), tput).unwrap()
    }

    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn open_loop_against_mock_service() {
        init_mock_service().await;

        let runner = HttpRunner::new(
            &workload(
                "/delay/ms",
                &[
                    ("5", ApiMethod::Get, "sockshop_GetCart"),
                    ("10", ApiMethod::Post, "sockshop_Login"),
                ],
            ),
            &Registry::builtin(),
        )
        .unwrap();

        let served_before = mock_service::served();
        let outcome = Engine::new(params(50), runner)
            .run(Mode::OpenLoop, CancellationToken::new())
            .await
            .unwrap();
        let report = outcome.report();

        // Every stat corresponds to a request the service actually handled.
        assert!(mock_service::served() - served_before >= report.total);

        assert!((80..=120).contains(&report.total), "total {}", report.total);
        assert_eq!(report.errors, 0);
        assert!(report.average_latency_nanos.unwrap() >= 5_000_000.);
        assert!(outcome
            .stats
            .iter()
            .all(|s| matches!(s.name.as_deref(), Some("5") | Some("10"))));
    }

    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn server_errors_become_error_stats() {
        init_mock_service().await;

        let runner = HttpRunner::new(
            &workload("/flaky/100/delay/ms", &[("1", ApiMethod::Get, "sockshop_ListTags")]),
            &Registry::builtin(),
        )
        .unwrap();

        let outcome = Engine::new(params(40), runner)
            .run(Mode::Pool, CancellationToken::new())
            .await
            .unwrap();
        let report = outcome.report();

        assert!(report.total > 0);
        assert_eq!(report.errors, report.total);
    }

    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn single_user_walks_workflow_in_order() {
        init_mock_service().await;

        let mut config = workload("/delay/ms", &[]);
        config.workflows = vec![WorkflowConfig {
            name: "shop".to_string(),
            steps: workload(
                "",
                &[
                    ("1", ApiMethod::Post, "sockshop_Login"),
                    ("2", ApiMethod::Post, "sockshop_AddItem"),
                    ("3", ApiMethod::Post, "sockshop_NewOrder"),
                ],
            )
            .apis,
        }];
        let runner = WorkflowRunner::new(&config, &Registry::builtin(), NonZeroUsize::MIN)
            .unwrap()
            .think_time(Duration::ZERO..Duration::ZERO, Duration::ZERO..Duration::ZERO);

        let outcome = Engine::new(RunParameters::new(1, 9, Duration::from_secs(5), 50).unwrap(), runner)
            .run(Mode::Pool, CancellationToken::new())
            .await
            .unwrap();
        let report = outcome.report();

        assert!(report.total > 0);
        assert_eq!(report.errors, 0);
        let names: Vec<_> = outcome.stats.iter().filter_map(|s| s.name.as_deref()).collect();
        for (i, name) in names.iter().enumerate() {
            assert_eq!(*name, ["1", "2", "3"][i % 3], "{names:?}");
        }
    }

    #[tokio::test]
    #[ntest::timeout(20_000)]
    async fn unreachable_service_is_an_error_not_a_failure() {
        let runner = HttpRunner::new(
            &WorkloadConfig {
                url: "http://127.0.0.1:9".to_string(),
                is_original: false,
                apis: vec![ApiConfig {
                    name: "nothing".to_string(),
                    method: ApiMethod::Get,
                    proportion: 1,
                    generator: "sockshop_GetSock".to_string(),
                }],
                workflows: vec![],
            },
            &Registry::builtin(),
        )
        .unwrap();

        let outcome = Engine::new(RunParameters::new(1, 5, Duration::from_secs(5), 20).unwrap(), runner)
            .run(Mode::Pool, CancellationToken::new())
            .await
            .unwrap();

        assert!(!outcome.stats.is_empty());
        assert!(outcome.stats.iter().all(|s| s.is_error));
    }
}
