use market_core::{
    Concept, FinishedLot, Grade, Market, MarketConfig, MenuItem, Scenario, Segment, Vendor,
    VendorId, exploitable_capacity, segment_demand,
};

// === FIXTURES ===

fn town() -> Scenario {
    Scenario::new("market town", 6000, 24)
        .with_share(Segment::Student, 0.20)
        .unwrap()
        .with_share(Segment::Worker, 0.35)
        .unwrap()
        .with_share(Segment::Family, 0.15)
        .unwrap()
        .with_share(Segment::Tourist, 0.15)
        .unwrap()
        .with_share(Segment::Senior, 0.15)
        .unwrap()
}

fn item(name: &str, price: f64, quality: f64, grade: Grade) -> MenuItem {
    MenuItem::new(name, price, quality).unwrap().with_grade_hint(grade)
}

/// Three concepts, two fast-food rivals, mixed staffing.
fn crowded_market() -> Market {
    let mut market = Market::default();
    market.insert_with(|id| {
        Vendor::new(id, "Burger Hut", Concept::FastFood, 25)
            .with_menu(vec![item("burger", 8.5, 0.5, Grade::G3Frozen)])
            .with_service_minutes(1800.0)
    });
    market.insert_with(|id| {
        Vendor::new(id, "Wrap Stop", Concept::FastFood, 15)
            .with_menu(vec![item("wrap", 9.0, 0.6, Grade::G4ReadyRaw)])
            .with_notoriety(0.3)
    });
    market.insert_with(|id| {
        Vendor::new(id, "Chez Marcel", Concept::Bistro, 30)
            .with_menu(vec![
                item("steak frites", 19.0, 0.7, Grade::G1Fresh),
                item("soupe", 11.0, 0.6, Grade::G2Canned),
                item("tarte", 8.0, 0.65, Grade::G1Fresh),
            ])
            .with_service_minutes(3000.0)
    });
    market.insert_with(|id| {
        Vendor::new(id, "L'Etoile", Concept::FineDining, 20)
            .with_menu(vec![item("menu degustation", 45.0, 0.95, Grade::G5SousVide)])
            .with_notoriety(0.8)
            .with_visibility(4.0)
    });
    market
}

/// Give every vendor a fresh lot of `portions` that keeps for one turn.
fn restock(market: &mut Market, portions: u32, grade: Grade) {
    let turn = market.turn;
    let ids = market.roster().to_vec();
    for id in ids {
        let vendor = market.vendor_mut(id).unwrap();
        let price = vendor.median_price();
        vendor
            .inventory
            .add_lot(FinishedLot::new("house special", grade, price, portions, turn, 1).unwrap());
    }
}

// === INVARIANTS ===

#[test]
fn invariant_notoriety_stays_in_unit_range() {
    let mut market = crowded_market();
    let scenario = town();
    // starved of stock: heavy losses every turn
    for turn in 0..200 {
        if turn % 10 == 0 {
            restock(&mut market, 50, Grade::G2Canned);
        }
        market.run_turn(&scenario).unwrap();
        for vendor in market.vendors_in_order() {
            assert!(
                (0.0..=1.0).contains(&vendor.notoriety),
                "{} notoriety {} at turn {}",
                vendor.name,
                vendor.notoriety,
                market.turn
            );
            assert!((0.0..=1.0).contains(&vendor.staff_satisfaction));
        }
    }
}

#[test]
fn invariant_losses_sum_to_unserved_allocation() {
    let mut market = crowded_market();
    let scenario = town();
    for turn in 0..scenario.turns {
        restock(&mut market, if turn % 2 == 0 { 400 } else { 2000 }, Grade::G1Fresh);
        let report = market.run_turn(&scenario).unwrap();
        for r in &report.vendors {
            assert!(r.customers_served <= r.customers_allocated);
            assert_eq!(
                r.losses.total(),
                r.customers_allocated - r.customers_served,
                "vendor {:?} turn {}",
                r.vendor,
                r.turn
            );
        }
    }
}

#[test]
fn invariant_allocation_within_capacity_and_demand() {
    let mut market = crowded_market();
    let scenario = town();
    let config = market.config().clone();
    let demand: u64 = segment_demand(&scenario).iter().map(|(_, n)| u64::from(*n)).sum();

    for _ in 0..12 {
        restock(&mut market, 3000, Grade::G5SousVide);
        let capacities: Vec<u32> = market
            .vendors_in_order()
            .iter()
            .map(|v| exploitable_capacity(v, &config))
            .collect();
        let report = market.run_turn(&scenario).unwrap();

        for (r, cap) in report.vendors.iter().zip(&capacities) {
            assert!(r.customers_allocated <= *cap);
            assert!(r.capacity <= *cap);
            assert!(r.service_capacity <= r.capacity);
            assert!(r.customers_served <= r.stock_available);
        }
        let allocated: u64 = report.vendors.iter().map(|r| u64::from(r.customers_allocated)).sum();
        assert_eq!(allocated + report.total_unserved(), demand);
        assert_eq!(report.total_demand(), demand);
    }
}

#[test]
fn invariant_segment_unserved_never_exceeds_segment_demand() {
    let mut market = crowded_market();
    let scenario = town();
    let report = market.run_turn(&scenario).unwrap();
    for ((seg_d, demand), (seg_u, unserved)) in
        report.segment_demand.iter().zip(&report.unserved_by_segment)
    {
        assert_eq!(seg_d, seg_u);
        assert!(unserved <= demand);
    }
}

#[test]
fn invariant_expired_stock_is_never_sold() {
    let mut market = Market::default();
    let id = market.add_vendor("deli", Concept::FastFood, 10);
    market
        .vendor_mut(id)
        .unwrap()
        .inventory
        .add_lot(FinishedLot::new("sandwich", Grade::G1Fresh, 7.0, 10_000, 0, 2).unwrap());
    let scenario = Scenario::new("lunch", 100, 5)
        .with_share(Segment::Worker, 1.0)
        .unwrap();

    let reports = market.run(&scenario).unwrap();
    let served: Vec<u32> = reports.iter().map(|r| r.vendors[0].customers_served).collect();
    // sellable through turn 2
    assert_eq!(served, vec![100, 100, 0, 0, 0]);
}

#[test]
fn invariant_vendor_without_rivals_is_not_diluted() {
    let config = MarketConfig::default();
    let solo = Vendor::new(VendorId::from_u64(1), "solo", Concept::Bistro, 10);
    let counts = market_core::demand::concept_counts([&solo]);
    assert_eq!(market_core::demand::factor_for(&solo, &counts, config.cannibalization_alpha), 1.0);
}
