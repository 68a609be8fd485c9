//! Property tests: state monotonicity under arbitrary call sequences and
//! serialization stability.

use copnet_paper_contract::prelude::*;
use proptest::prelude::*;

// =============================================================================
// TEST HELPERS
// =============================================================================

const OPERATORS: [&str; 3] = ["PC", "RQ", "SAAQ"];
const ORGS: [&str; 2] = ["Org1MSP", "Org2MSP"];

#[derive(Debug, Clone)]
struct Step {
    transition: Transition,
    current: &'static str,
    next: &'static str,
    msp_id: &'static str,
}

fn step() -> impl Strategy<Value = Step> {
    (
        prop::sample::select(Transition::ALL.to_vec()),
        prop::sample::select(OPERATORS.to_vec()),
        prop::sample::select(OPERATORS.to_vec()),
        prop::sample::select(ORGS.to_vec()),
    )
        .prop_map(|(transition, current, next, msp_id)| Step {
            transition,
            current,
            next,
            msp_id,
        })
}

fn step_args(step: &Step) -> Vec<String> {
    let mut args = vec!["PC", "0001"];
    match step.transition {
        Transition::Issue => args.extend(["t", step.current, step.next]),
        Transition::Treat => args.extend([step.current, step.next, "t", "h", "1200"]),
        Transition::Deliver => args.extend([step.current, step.next, "t", "F", "D"]),
        _ => args.extend([step.current, step.next]),
    }
    args.into_iter().map(str::to_string).collect()
}

fn read_state(service: &PaperContractService<InMemoryLedger>) -> Option<PaperState> {
    let key = CompositeKey::new(copnet_paper_contract::PAPER_NAMESPACE, &["PC", "0001"]).ok()?;
    let bytes = service.ledger().get_committed(key.as_str())?;
    VdxPaper::from_bytes(&bytes).ok()?.state()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// =============================================================================
// PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn state_never_regresses(steps in prop::collection::vec(step(), 1..40)) {
        let rt = runtime();
        let service = create_test_service();
        let org1 = ClientIdentity::new("admin", "Org1MSP");
        let create: Vec<String> = ["PC", "0001", "t", "n", "v", "f", "a", "l"]
            .iter().map(|s| (*s).to_string()).collect();
        rt.block_on(service.submit_transaction(&org1, "create", &create)).unwrap();

        let mut last = read_state(&service);
        for step in &steps {
            let caller = ClientIdentity::new("user", step.msp_id);
            let result = rt.block_on(service.submit_transaction(
                &caller,
                step.transition.name(),
                &step_args(step),
            ));
            let now = read_state(&service);
            prop_assert!(now >= last);
            if let Some(prev) = last {
                prop_assert!(now == Some(prev) || now == prev.next());
            }
            if result.is_err() {
                prop_assert_eq!(now, last);
            }
            last = now;
        }
    }

    #[test]
    fn paper_bytes_round_trip(
        issuer in "[A-Za-z0-9]{1,8}",
        number in "[0-9]{1,6}",
        fullname in "\\PC{0,24}",
        vat in prop::option::of((0u32..1_000_000).prop_map(f64::from)),
        state in prop::sample::select(PaperState::ORDER.to_vec()),
    ) {
        let mut paper = VdxPaper::create_instance(
            issuer.as_str(),
            number.as_str(),
            "2020-01-01",
            PaperDetails { fullname, ..PaperDetails::default() },
        );
        paper.set_state(state);
        paper.set_operator(issuer.as_str());
        paper.vat = vat;

        let bytes = paper.to_bytes().unwrap();
        let decoded = VdxPaper::from_bytes(&bytes).unwrap();
        prop_assert_eq!(&decoded, &paper);
        prop_assert_eq!(decoded.to_bytes().unwrap(), bytes);
    }
}
