use alloy::sol;

sol! {
    #[sol(rpc)]
    interface ICreate2Factory {
        event Deployed(address addr, uint256 salt);

        function deploy(bytes memory code, uint256 salt) external;
    }
}

sol! {
    #[sol(rpc)]
    interface IDAOFactory {
        event DAOSuperAppCreated(address indexed _owner, address superApp, address underlying, address superToken);
        event DAOGovernorCreated(address indexed _owner, address _contract, address _timelock);

        function createDAOSuperApp(
            string memory name,
            string memory symbol,
            address accepted,
            address weth,
            address host,
            address cfa,
            address router
        ) external returns (address);

        function createGoverance(address token, bool vetoable, uint256 votingPeriod) external returns (address);

        function initialize(
            address tokenImplementation,
            address appImplementation,
            address governorImplementation,
            address executorImplementation
        ) external;
    }
}

sol! {
    #[sol(rpc)]
    interface IDAOSuperApp {
        function acceptedToken() external view returns (address);
        function want() external view returns (address);
        function underlying() external view returns (address);
        function daoToken() external view returns (address);
        function treasury() external view returns (address);
        function sharePrice() external view returns (uint256);
        function depositsEnabled() external view returns (bool);
        function streamsEnabled() external view returns (bool);
        function getNetFlow() external view returns (int96);

        function deposit(address token, uint256 amount, address beneficiary) external;
        function grant(address to, uint256 amount) external;
        function setDepositsEnabled(bool enabled) external;
        function setStreamsEnabled(bool enabled) external;

        function hasRole(bytes32 role, address account) external view returns (bool);
        function grantRole(bytes32 role, address account) external;
    }
}

sol! {
    #[sol(rpc)]
    interface ISuperfluidHost {
        function callAgreement(address agreementClass, bytes memory callData, bytes memory userData) external returns (bytes memory returnedData);
        function isApp(address app) external view returns (bool);
    }
}

sol! {
    #[sol(rpc)]
    interface ICFAv1 {
        event FlowUpdated(
            address indexed token,
            address indexed sender,
            address indexed receiver,
            int96 flowRate,
            int256 totalSenderFlowRate,
            int256 totalReceiverFlowRate,
            bytes userData
        );

        function createFlow(address token, address receiver, int96 flowRate, bytes memory ctx) external returns (bytes memory newCtx);
        function updateFlow(address token, address receiver, int96 flowRate, bytes memory ctx) external returns (bytes memory newCtx);
        function deleteFlow(address token, address sender, address receiver, bytes memory ctx) external returns (bytes memory newCtx);

        function getFlow(address token, address sender, address receiver)
            external
            view
            returns (uint256 timestamp, int96 flowRate, uint256 deposit, uint256 owedDeposit);

        function getNetFlow(address token, address account) external view returns (int96 flowRate);
    }
}

sol! {
    #[sol(rpc)]
    interface ISuperToken {
        function upgrade(uint256 amount) external;
        function downgrade(uint256 amount) external;
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function getUnderlyingToken() external view returns (address);
    }
}

sol! {
    #[sol(rpc)]
    interface IERC20 {
        function balanceOf(address account) external view returns (uint256);
        function approve(address spender, uint256 amount) external returns (bool);
        function transfer(address recipient, uint256 amount) external returns (bool);
        function symbol() external view returns (string memory);
        function decimals() external view returns (uint8);
    }
}

sol! {
    // Faucet token on Superfluid testnets.
    #[sol(rpc)]
    interface IFakeDAI {
        function allocateTo(address owner, uint256 value) external;
    }
}

sol! {
    #[sol(rpc)]
    interface IDAOGovernor {
        function propose(
            address[] memory targets,
            uint256[] memory values,
            bytes[] memory calldatas,
            string memory description
        ) external returns (uint256);

        function hashProposal(
            address[] memory targets,
            uint256[] memory values,
            bytes[] memory calldatas,
            bytes32 descriptionHash
        ) external pure returns (uint256);

        function state(uint256 proposalId) external view returns (uint8);

        function queue(
            address[] memory targets,
            uint256[] memory values,
            bytes[] memory calldatas,
            bytes32 descriptionHash
        ) external returns (uint256);

        function execute(
            address[] memory targets,
            uint256[] memory values,
            bytes[] memory calldatas,
            bytes32 descriptionHash
        ) external payable returns (uint256);
    }
}

sol! {
    #[sol(rpc)]
    interface ISuperfluidGovernance {
        function authorizeAppFactory(address host, address factory) external;
        function isAuthorizedAppFactory(address host, address factory) external view returns (bool);
    }
}
