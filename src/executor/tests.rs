use super::*;
use crate::models::{AccountState, MessageEnvelope};
use crate::tvm::{Address, Builder, Cell};
use crate::vm_ensure;
use num_bigint::BigUint;
use std::sync::Arc;

struct FnContract<F> {
    code: Arc<Cell>,
    f: F,
}

impl<F> Contract for FnContract<F>
where
    F: Fn(&mut ComputeContext<'_>) -> VmResult<()> + Send + Sync,
{
    fn name(&self) -> &str {
        "test"
    }

    fn code(&self) -> Arc<Cell> {
        self.code.clone()
    }

    fn receive(&self, ctx: &mut ComputeContext<'_>) -> VmResult<()> {
        (self.f)(ctx)
    }
}

fn contract<F>(f: F) -> Arc<dyn Contract>
where
    F: Fn(&mut ComputeContext<'_>) -> VmResult<()> + Send + Sync + 'static,
{
    Arc::new(FnContract {
        code: native_code_cell("test", 1).unwrap(),
        f,
    })
}

const SENDER: Address = Address::new(0, [0xaa; 32]);
const RECIPIENT: Address = Address::new(0, [0xbb; 32]);

fn setup(logic: Arc<dyn Contract>) -> (ContractRegistry, AccountState) {
    let mut registry = ContractRegistry::new();
    let code = registry.register(logic);
    let account = AccountState::new(RECIPIENT, code, data_cell(7), BigUint::from(1_000u32));
    (registry, account)
}

fn data_cell(value: u32) -> Arc<Cell> {
    let mut builder = Builder::new();
    builder.store_u32(value).unwrap();
    builder.build().unwrap()
}

fn message(value: u32, body: Arc<Cell>) -> MessageEnvelope {
    MessageEnvelope::internal(SENDER, RECIPIENT, value, body)
}

/// Throws the exit code found in the first 32 bits of the body
fn thrower() -> Arc<dyn Contract> {
    contract(|ctx| {
        let code = ctx.body()?.load_u32()?;
        let new_data = data_cell(code);
        ctx.set_data(new_data);
        vm_ensure!(code == 0, code);
        Ok(())
    })
}

#[test]
fn test_missing_account_is_no_code() {
    let executor = Executor::default();
    let msg = message(100, Cell::empty_cell());
    let tx = executor.execute(&NoContracts, None, &msg, 1);

    assert_eq!(tx.exit_code, 0xFFFF_FFFF);
    assert!(!tx.success);
    assert!(tx.state.is_none());

    let bounce = tx.bounce_message().unwrap();
    assert_eq!(bounce.to, SENDER);
    assert_eq!(bounce.value, BigUint::from(100u32));
}

#[test]
fn test_uninit_account_is_no_code() {
    let mut config = ExecutorConfig::default();
    config.exit_codes.no_code = 404;
    let executor = Executor::new(config);

    let account = AccountState::uninit(RECIPIENT, BigUint::from(5u32));
    let msg = message(100, Cell::empty_cell()).with_bounce(false);
    let tx = executor.execute(&NoContracts, Some(&account), &msg, 1);

    assert_eq!(tx.exit_code, 404);
    assert_eq!(tx.state.as_ref(), Some(&account));
    assert!(tx.out_msgs.is_empty());
}

#[test]
fn test_unknown_code_is_invalid_opcode() {
    let (_, account) = setup(thrower());
    let tx = Executor::default().execute(&NoContracts, Some(&account), &message(1, data_cell(0)), 1);
    assert_eq!(tx.exit_code, 6);
    assert_eq!(tx.state.as_ref(), Some(&account));
}

#[test]
fn test_success_commits_and_credits() {
    let (registry, account) = setup(thrower());
    let tx = Executor::default().execute(&registry, Some(&account), &message(250, data_cell(0)), 1);

    assert_eq!(tx.exit_code, EXIT_SUCCESS);
    assert!(tx.success);
    assert!(tx.gas_used > 0);
    let state = tx.state.unwrap();
    assert_eq!(state.data, data_cell(0));
    assert_eq!(state.balance, BigUint::from(1_250u32));
}

#[test]
fn test_alt_success_commits() {
    let (registry, account) = setup(thrower());
    let tx = Executor::default().execute(&registry, Some(&account), &message(0, data_cell(1)), 1);

    assert_eq!(tx.exit_code, EXIT_ALT_SUCCESS);
    assert!(tx.success);
    assert_eq!(tx.state.unwrap().data, data_cell(1));
}

#[test]
fn test_failure_rolls_back_and_bounces() {
    let (registry, account) = setup(thrower());
    let msg = message(300, data_cell(77));
    let tx = Executor::default().execute(&registry, Some(&account), &msg, 1);

    assert_eq!(tx.exit_code, 77);
    assert!(!tx.success);
    assert_eq!(tx.state.as_ref(), Some(&account));

    assert_eq!(tx.out_msgs.len(), 1);
    let bounce = tx.bounce_message().unwrap();
    assert_eq!(bounce.from, RECIPIENT);
    assert_eq!(bounce.value, msg.value);
    assert_eq!(bounce.body.bit_len(), 32 + 32);
}

#[test]
fn test_bounced_message_does_not_bounce_again() {
    let (registry, account) = setup(thrower());
    let msg = message(300, data_cell(77)).with_bounced(true);
    let tx = Executor::default().execute(&registry, Some(&account), &msg, 1);

    assert_eq!(tx.exit_code, 77);
    assert!(tx.out_msgs.is_empty());
}

#[test]
fn test_short_body_is_cell_underflow() {
    let (registry, account) = setup(thrower());
    let mut body = Builder::new();
    body.store_bit(true).unwrap();
    let tx = Executor::default().execute(
        &registry,
        Some(&account),
        &message(0, body.build().unwrap()),
        1,
    );
    assert_eq!(tx.exit_code, 9);
}

#[test]
fn test_builder_overflow_is_cell_overflow() {
    let (registry, account) = setup(contract(|ctx| {
        let mut builder = Builder::new();
        for _ in 0..32 {
            builder.store_u32(0)?;
        }
        ctx.build(builder)?;
        Ok(())
    }));
    let tx = Executor::default().execute(&registry, Some(&account), &message(0, Cell::empty_cell()), 1);
    assert_eq!(tx.exit_code, 8);
}

#[test]
fn test_out_of_gas_rolls_back() {
    let (registry, account) = setup(contract(|ctx| {
        ctx.set_data(Cell::empty_cell());
        loop {
            ctx.body()?;
        }
    }));
    let config = ExecutorConfig {
        gas_limit: 1_000,
        ..Default::default()
    };
    let tx = Executor::new(config).execute(
        &registry,
        Some(&account),
        &message(10, Cell::empty_cell()),
        1,
    );

    assert_eq!(tx.exit_code, 13);
    assert_eq!(tx.gas_used, 1_000);
    assert_eq!(tx.state.as_ref(), Some(&account));
}

#[test]
fn test_outbound_value_over_balance_is_insufficient_funds() {
    let (registry, account) = setup(contract(|ctx| {
        let body = ctx.build(Builder::new())?;
        ctx.send(SENDER, 2_000u32, false, body)?;
        ctx.set_data(Cell::empty_cell());
        Ok(())
    }));

    let tx = Executor::default().execute(
        &registry,
        Some(&account),
        &message(500, Cell::empty_cell()).with_bounce(false),
        1,
    );
    assert_eq!(tx.exit_code, 37);
    assert_eq!(tx.state.as_ref(), Some(&account));
    assert!(tx.out_msgs.is_empty());

    let tx = Executor::default().execute(
        &registry,
        Some(&account),
        &message(1_000, Cell::empty_cell()),
        2,
    );
    assert!(tx.success);
    assert_eq!(tx.out_msgs.len(), 1);
    assert_eq!(tx.state.unwrap().balance, BigUint::from(0u32));
}

#[test]
fn test_execution_is_deterministic() {
    let (registry, account) = setup(thrower());
    let executor = Executor::default();
    for code in [0u32, 1, 9, 75, 77, 8192] {
        let msg = message(42, data_cell(code));
        let first = executor.execute(&registry, Some(&account), &msg, 10);
        let second = executor.execute(&registry, Some(&account), &msg, 10);
        assert_eq!(first, second);
    }
}
