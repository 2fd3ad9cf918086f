use commodity_board::util::to_two_places;
use commodity_board::{BoardError, Decimal, IdSequence, Order, OrderBoard, OrderId, Side};
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

struct Desk {
    board: OrderBoard,
    ids: IdSequence,
}

impl Desk {
    fn new() -> Self {
        Self {
            board: OrderBoard::new(),
            ids: IdSequence::new(),
        }
    }

    fn place(&mut self, quantity: &str, price: &str, side: Side) -> OrderId {
        let order = Order::new(&mut self.ids, quantity, price, side, None).unwrap();
        let id = order.id();
        self.board.add_order(order).unwrap();
        id
    }

    fn total(&self, side: Side, price: Decimal) -> Option<Decimal> {
        self.board.level_total(side, price).map(|total| total.quantity())
    }
}

struct ScenarioA {
    desk: Desk,
    sell_306_first: OrderId,
    sell_310: OrderId,
    sell_306_second: OrderId,
    buy_310_first: OrderId,
    buy_310_second: OrderId,
}

fn scenario_a() -> ScenarioA {
    let mut desk = Desk::new();
    let sell_306_first = desk.place("3.5", "306", Side::Sell);
    let sell_310 = desk.place("1.2", "310", Side::Sell);
    desk.place("1.5", "307", Side::Sell);
    let sell_306_second = desk.place("2", "306", Side::Sell);
    desk.place("1", "308", Side::Buy);
    let buy_310_first = desk.place("2", "310", Side::Buy);
    let buy_310_second = desk.place("3", "310", Side::Buy);
    ScenarioA {
        desk,
        sell_306_first,
        sell_310,
        sell_306_second,
        buy_310_first,
        buy_310_second,
    }
}

#[test]
fn scenario_a_aggregates_levels() {
    let a = scenario_a();
    let board = &a.desk.board;

    assert_eq!(board.orders().len(), 7);
    assert_eq!(board.sell_levels().len(), 3);
    assert_eq!(board.buy_levels().len(), 2);
    assert_eq!(board.display_live_board().len(), 5);

    let first = board.find_order(a.sell_306_first).unwrap().shared_total().unwrap();
    let second = board.find_order(a.sell_306_second).unwrap().shared_total().unwrap();
    assert!(first.same_as(second));
    assert_eq!(first.quantity(), dec!(5.50));

    let first = board.find_order(a.buy_310_first).unwrap().shared_total().unwrap();
    let second = board.find_order(a.buy_310_second).unwrap().shared_total().unwrap();
    assert!(first.same_as(second));
    assert_eq!(first.quantity(), dec!(5.00));
}

#[test]
fn scenario_b_display_lines() {
    let a = scenario_a();

    assert_eq!(
        a.desk.board.display_live_board(),
        vec![
            "SELL 5.5 kg for £306",
            "SELL 1.5 kg for £307",
            "SELL 1.2 kg for £310",
            "BUY 5 kg for £310",
            "BUY 1 kg for £308",
        ]
    );
}

#[test]
fn scenario_c_partial_cancel() {
    let mut a = scenario_a();
    let levels_before = a.desk.board.sell_levels().len();

    a.desk.board.cancel_order(a.sell_306_second);

    let remaining = a.desk.board.find_order(a.sell_306_first).unwrap();
    assert_eq!(remaining.total_quantity(), Some(dec!(3.50)));
    assert_eq!(a.desk.total(Side::Sell, dec!(306)), Some(dec!(3.50)));
    assert_eq!(a.desk.board.orders().len(), 6);
    assert_eq!(a.desk.board.sell_levels().len(), levels_before);
    assert_eq!(a.desk.board.display_live_board()[0], "SELL 3.5 kg for £306");
}

#[test]
fn scenario_d_full_cancel() {
    let mut a = scenario_a();

    a.desk.board.cancel_order(a.sell_310);
    assert!(!a.desk.board.sell_levels().contains_key(&dec!(310)));
    assert_eq!(a.desk.total(Side::Sell, dec!(310)), None);

    // Reduce the 310 buy level to one contributor, then cancel that too
    a.desk.board.cancel_order(a.buy_310_first);
    assert_eq!(a.desk.total(Side::Buy, dec!(310)), Some(dec!(3)));
    a.desk.board.cancel_order(a.buy_310_second);
    assert!(!a.desk.board.buy_levels().contains_key(&dec!(310)));

    assert_eq!(
        a.desk.board.display_live_board(),
        vec!["SELL 5.5 kg for £306", "SELL 1.5 kg for £307", "BUY 1 kg for £308"]
    );
}

#[test]
fn cancel_unknown_id_changes_nothing() {
    let mut a = scenario_a();
    let before = a.desk.board.live_rows();

    assert!(!a.desk.board.cancel_order(10_000));

    assert_eq!(a.desk.board.live_rows(), before);
    assert_eq!(a.desk.board.orders().len(), 7);
}

#[test]
fn decimal_round_trip() {
    assert_eq!(to_two_places("2.005").unwrap(), dec!(2.01));
    assert!(matches!(
        to_two_places("junk"),
        Err(BoardError::InvalidNumber { .. })
    ));

    let mut ids = IdSequence::new();
    assert!(matches!(
        Order::new(&mut ids, "junk", "306", Side::Sell, None),
        Err(BoardError::InvalidNumber { .. })
    ));
}

#[test]
fn boards_have_independent_id_sequences() {
    let first = scenario_a();
    let second = scenario_a();

    assert_eq!(first.sell_306_first, second.sell_306_first);
    assert_eq!(first.buy_310_second, 6);
}
